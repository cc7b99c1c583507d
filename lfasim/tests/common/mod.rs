//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use lfasim::collections::{EdgeIndex, NodeIndex};
use lfasim::edge::{EdgeEnd, ProtectionType};
use lfasim::graph::Graph;
use lfasim::level::{LevelNumber, LevelType};
use lfasim::num::Metric;
use lfasim::spf::SpfResult;
use lfasim::topology::TopologyDesc;

//
// Helper functions.
//

// Builds a graph from a TOML topology description.
pub fn build(topology: &str) -> Graph {
    TopologyDesc::from_toml(topology).unwrap().build().unwrap()
}

// Builds a graph made of the given routers, all participating in both levels.
pub fn routers(names: &[&str]) -> Graph {
    let mut graph = Graph::default();
    for (i, name) in names.iter().enumerate() {
        let router_id = Ipv4Addr::new(1, 1, 1, i as u8 + 1);
        graph.add_node(name, router_id, LevelType::All).unwrap();
    }
    graph
}

// Connects two routers with a point-to-point link. Interfaces are named after
// the remote router.
pub fn connect(
    graph: &mut Graph,
    a: &str,
    b: &str,
    metric: Metric,
) -> (EdgeIndex, EdgeIndex) {
    let a_idx = node(graph, a);
    let b_idx = node(graph, b);
    graph
        .add_link(
            EdgeEnd::new(a_idx, format!("eth-{b}"), None),
            EdgeEnd::new(b_idx, format!("eth-{a}"), None),
            metric,
            LevelType::All,
        )
        .unwrap()
}

// Builds a ring of `size` routers named rt1..rtN with uniform metrics.
pub fn ring(size: usize, metric: Metric) -> Graph {
    let names = (1..=size).map(|i| format!("rt{i}")).collect::<Vec<_>>();
    let names = names.iter().map(String::as_str).collect::<Vec<_>>();
    let mut graph = routers(&names);
    for i in 0..size {
        connect(&mut graph, names[i], names[(i + 1) % size], metric);
    }
    graph
}

// Builds a `rows` x `cols` grid of routers named rt-R-C. Metrics vary with the
// position of the link so that both unique and equal-cost paths exist.
pub fn grid(rows: usize, cols: usize) -> Graph {
    let names = (0..rows)
        .flat_map(|r| (0..cols).map(move |c| format!("rt-{r}-{c}")))
        .collect::<Vec<_>>();
    let mut graph = Graph::default();
    for (i, name) in names.iter().enumerate() {
        let router_id = Ipv4Addr::from(0x0a00_0000 + i as u32 + 1);
        graph.add_node(name, router_id, LevelType::All).unwrap();
    }
    for r in 0..rows {
        for c in 0..cols {
            let name = format!("rt-{r}-{c}");
            if c + 1 < cols {
                let metric = 10 + ((r * 7 + c * 3) % 4) as Metric * 5;
                connect(&mut graph, &name, &format!("rt-{r}-{}", c + 1), metric);
            }
            if r + 1 < rows {
                let metric = 10 + ((r * 3 + c * 5) % 3) as Metric * 5;
                connect(&mut graph, &name, &format!("rt-{}-{c}", r + 1), metric);
            }
        }
    }
    graph
}

pub fn node(graph: &Graph, name: &str) -> NodeIndex {
    graph.nodes.lookup(name).unwrap()
}

pub fn edge(graph: &Graph, node_name: &str, ifname: &str) -> EdgeIndex {
    graph.edge_by_ifname(node(graph, node_name), ifname).unwrap()
}

pub fn name(graph: &Graph, node_idx: NodeIndex) -> String {
    graph.nodes[node_idx].name.clone()
}

// Sets the protection of the given interface.
pub fn protect(
    graph: &mut Graph,
    node_name: &str,
    ifname: &str,
    protection: ProtectionType,
) -> EdgeIndex {
    let edge_idx = edge(graph, node_name, ifname);
    graph.set_protection(edge_idx, protection);
    edge_idx
}

// Returns the names of the IP next-hop routers of an SPF result.
pub fn nexthop_names(graph: &Graph, result: &SpfResult) -> BTreeSet<String> {
    result
        .nexthops
        .ip
        .iter()
        .map(|nexthop| name(graph, nexthop.node))
        .collect()
}

// Returns the SPF result of the given root for the given destination.
pub fn result<'a>(
    graph: &'a Graph,
    root: &str,
    dest: &str,
    level: LevelNumber,
) -> &'a SpfResult {
    graph.nodes[node(graph, root)]
        .spf_result(level, node(graph, dest))
        .unwrap()
}

// Summarizes the result list of a root: destination name to metric and
// next-hop names.
pub fn summary(
    graph: &Graph,
    root: &str,
    level: LevelNumber,
) -> BTreeMap<String, (Metric, BTreeSet<String>)> {
    graph.nodes[node(graph, root)]
        .spf_results(level)
        .iter()
        .map(|result| {
            (
                name(graph, result.node),
                (result.metric, nexthop_names(graph, result)),
            )
        })
        .collect()
}

pub fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}

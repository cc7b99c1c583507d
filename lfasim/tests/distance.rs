//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use common::*;
use lfasim::distance::distance;
use lfasim::error::Error;
use lfasim::level::LevelNumber;
use lfasim::num::INFINITE_METRIC;
use lfasim::spf::{SpfContext, SpfRunKind, run_spf};

const TOPOLOGY: &str = r#"
[[nodes]]
name = "rt1"
router-id = "1.1.1.1"

[[nodes]]
name = "rt2"
router-id = "2.2.2.2"

[[nodes]]
name = "rt3"
router-id = "3.3.3.3"

[[nodes]]
name = "rt4"
router-id = "4.4.4.4"

[[nodes]]
name = "rt5"
router-id = "5.5.5.5"

[[lans]]
name = "lan1"
members = [
  { node = "rt1", ifname = "eth0", metric = 5 },
  { node = "rt2", ifname = "eth0", metric = 5 },
]

[[lans]]
name = "lan2"
members = [
  { node = "rt2", ifname = "eth1" },
  { node = "rt3", ifname = "eth0" },
]

[[links]]
a = { node = "rt3", ifname = "eth-rt4" }
b = { node = "rt4", ifname = "eth-rt3" }
metric = 20
"#;

fn forward(ctx: &mut SpfContext, graph: &mut lfasim::graph::Graph, name: &str) {
    let node_idx = node(graph, name);
    run_spf(ctx, graph, node_idx, LevelNumber::L1, SpfRunKind::Forward)
        .unwrap();
}

#[test]
fn test_distance_routers() {
    let mut graph = build(TOPOLOGY);
    let mut ctx = SpfContext::default();
    forward(&mut ctx, &mut graph, "rt1");
    forward(&mut ctx, &mut graph, "rt4");

    let rt1 = node(&graph, "rt1");
    let rt3 = node(&graph, "rt3");
    let rt4 = node(&graph, "rt4");
    let level = LevelNumber::L1;
    assert_eq!(distance(&graph, rt1, rt3, level).unwrap(), 15);
    assert_eq!(distance(&graph, rt1, rt4, level).unwrap(), 35);
    assert_eq!(distance(&graph, rt4, rt1, level).unwrap(), 35);

    // Nodes that are isolated from the root are unreachable.
    let rt5 = node(&graph, "rt5");
    assert_eq!(distance(&graph, rt1, rt5, level).unwrap(), INFINITE_METRIC);

    // Same node, even without any computation.
    assert_eq!(distance(&graph, rt5, rt5, level).unwrap(), 0);
}

#[test]
fn test_distance_pseudonodes() {
    let mut graph = build(TOPOLOGY);
    let mut ctx = SpfContext::default();
    forward(&mut ctx, &mut graph, "rt4");
    forward(&mut ctx, &mut graph, "lan1");

    let level = LevelNumber::L1;
    let rt1 = node(&graph, "rt1");
    let rt4 = node(&graph, "rt4");
    let lan1 = node(&graph, "lan1");
    let lan2 = node(&graph, "lan2");

    // Router to pseudo-node, through the result cached by the pseudo-node.
    assert_eq!(distance(&graph, rt4, lan2, level).unwrap(), 30);
    assert_eq!(distance(&graph, rt4, lan1, level).unwrap(), 35);

    // Pseudo-node to router, from the pseudo-node's own results.
    assert_eq!(distance(&graph, lan1, rt1, level).unwrap(), 0);
    assert_eq!(distance(&graph, lan1, rt4, level).unwrap(), 30);

    // Pseudo-node pairs are rejected.
    let error = distance(&graph, lan1, lan2, level).unwrap_err();
    assert!(matches!(error, Error::DistancePseudonodePair(..)));
}

#[test]
fn test_distance_overloaded_source() {
    let mut graph = build(TOPOLOGY);
    let mut ctx = SpfContext::default();
    forward(&mut ctx, &mut graph, "rt1");

    let rt1 = node(&graph, "rt1");
    let rt3 = node(&graph, "rt3");
    graph.set_overload(rt1, LevelNumber::L1, true);
    assert_eq!(
        distance(&graph, rt1, rt3, LevelNumber::L1).unwrap(),
        INFINITE_METRIC
    );
    assert_eq!(distance(&graph, rt1, rt1, LevelNumber::L1).unwrap(), 0);
}

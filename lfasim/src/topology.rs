//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Topology descriptions.
//!
//! A topology is described in TOML or JSON as a list of routers, LAN
//! segments, point-to-point links and LSP adjacencies:
//!
//! ```toml
//! [[nodes]]
//! name = "rt1"
//! router-id = "1.1.1.1"
//! prefixes = ["10.0.0.1/32"]
//!
//! [[links]]
//! a = { node = "rt1", ifname = "eth-rt2", prefix = "10.0.1.1/24" }
//! b = { node = "rt2", ifname = "eth-rt1", prefix = "10.0.1.2/24" }
//! metric = 10
//! protection = "link-and-node"
//! ```

use std::net::Ipv4Addr;
use std::path::Path;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::debug::Debug;
use crate::edge::{EdgeEnd, ProtectionType};
use crate::error::{Error, TopologyError};
use crate::graph::Graph;
use crate::level::{LevelNumber, LevelType};
use crate::num::Metric;

const DFLT_METRIC: Metric = 10;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopologyDesc {
    pub nodes: Vec<NodeDesc>,
    pub lans: Vec<LanDesc>,
    pub links: Vec<LinkDesc>,
    pub lsps: Vec<LspDesc>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct NodeDesc {
    pub name: String,
    pub router_id: Ipv4Addr,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default = "dflt_level")]
    pub level: LevelType,
    // Levels in which the overload bit is set.
    #[serde(default)]
    pub overload: Vec<LevelNumber>,
    #[serde(default)]
    pub attached: bool,
    #[serde(default)]
    pub prefixes: Vec<IpNetwork>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LanDesc {
    // Name of the pseudo-node representing the LAN.
    pub name: String,
    #[serde(default = "dflt_level")]
    pub level: LevelType,
    pub members: Vec<LanMemberDesc>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LanMemberDesc {
    pub node: String,
    pub ifname: String,
    #[serde(default)]
    pub prefix: Option<IpNetwork>,
    #[serde(default = "dflt_metric")]
    pub metric: Metric,
    #[serde(default)]
    pub protection: ProtectionType,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LinkDesc {
    pub a: EndDesc,
    pub b: EndDesc,
    #[serde(default = "dflt_metric")]
    pub metric: Metric,
    // Level 2 metric, when different from the level 1 one.
    #[serde(default)]
    pub l2_metric: Option<Metric>,
    #[serde(default = "dflt_level")]
    pub level: LevelType,
    #[serde(default = "dflt_up")]
    pub up: bool,
    // Protection applied on both sides of the link.
    #[serde(default)]
    pub protection: ProtectionType,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LspDesc {
    pub from: String,
    pub to: String,
    pub ifname: String,
    #[serde(default = "dflt_metric")]
    pub metric: Metric,
    #[serde(default = "dflt_level")]
    pub level: LevelType,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndDesc {
    pub node: String,
    pub ifname: String,
    #[serde(default)]
    pub prefix: Option<IpNetwork>,
}

// ===== impl TopologyDesc =====

impl TopologyDesc {
    pub fn from_toml(data: &str) -> Result<TopologyDesc, Error> {
        toml::from_str(data)
            .map_err(TopologyError::from)
            .map_err(Error::from)
    }

    pub fn from_json(data: &str) -> Result<TopologyDesc, Error> {
        serde_json::from_str(data)
            .map_err(TopologyError::from)
            .map_err(Error::from)
    }

    // Reads a topology file. The format is selected by the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<TopologyDesc, Error> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|error| {
            TopologyError::ReadError(path.to_owned(), error)
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => TopologyDesc::from_toml(&data),
            Some("json") => TopologyDesc::from_json(&data),
            _ => Err(TopologyError::UnknownFormat(path.to_owned()).into()),
        }
    }

    // Builds the graph described by this topology.
    pub fn build(&self) -> Result<Graph, Error> {
        let mut graph = Graph::default();

        for desc in &self.nodes {
            let node_idx =
                graph.add_node(&desc.name, desc.router_id, desc.level)?;
            let node = &mut graph.nodes[node_idx];
            node.area = desc.area.clone();
            node.attached = desc.attached;
            node.prefixes = desc.prefixes.clone();
            for level in desc.overload.iter().copied() {
                graph.set_overload(node_idx, level, true);
            }
        }

        for desc in &self.lans {
            let pn_idx = graph.add_pseudonode(&desc.name, desc.level)?;
            for member in &desc.members {
                let end = resolve_end(
                    &graph,
                    &member.node,
                    &member.ifname,
                    member.prefix,
                )?;
                let (edge_idx, _) = graph.add_lan_link(
                    end,
                    pn_idx,
                    member.metric,
                    desc.level,
                )?;
                graph.set_protection(edge_idx, member.protection);
            }
        }

        for desc in &self.links {
            let a = desc.a.resolve(&graph)?;
            let b = desc.b.resolve(&graph)?;
            let (ab, ba) = graph.add_link(a, b, desc.metric, desc.level)?;
            for edge_idx in [ab, ba] {
                if let Some(l2_metric) = desc.l2_metric {
                    graph.set_metric(edge_idx, LevelNumber::L2, l2_metric);
                }
                graph.set_protection(edge_idx, desc.protection);
            }
            if !desc.up {
                graph.set_link_status(ab, false);
            }
        }

        for desc in &self.lsps {
            let from = graph.nodes.lookup(&desc.from)?;
            let to = graph.nodes.lookup(&desc.to)?;
            graph.add_lsp_adjacency(
                from,
                to,
                &desc.ifname,
                desc.metric,
                desc.level,
            )?;
        }

        Debug::TopologyBuild(&graph).log();
        Ok(graph)
    }
}

// ===== impl EndDesc =====

impl EndDesc {
    fn resolve(&self, graph: &Graph) -> Result<EdgeEnd, Error> {
        resolve_end(graph, &self.node, &self.ifname, self.prefix)
    }
}

// ===== helper functions =====

fn resolve_end(
    graph: &Graph,
    node: &str,
    ifname: &str,
    prefix: Option<IpNetwork>,
) -> Result<EdgeEnd, Error> {
    let node_idx = graph.nodes.lookup(node)?;
    Ok(EdgeEnd::new(node_idx, ifname.to_owned(), prefix))
}

fn dflt_level() -> LevelType {
    LevelType::All
}

fn dflt_metric() -> Metric {
    DFLT_METRIC
}

fn dflt_up() -> bool {
    true
}

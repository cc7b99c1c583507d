//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use derive_new::new;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::collections::{EdgeIndex, NodeIndex};
use crate::level::{LevelFlags, LevelNumber, Levels};
use crate::num::Metric;
use crate::spf::NexthopKind;

// Directed edge between two nodes.
#[derive(Debug)]
pub struct Edge {
    pub index: EdgeIndex,
    pub from: EdgeEnd,
    pub to: EdgeEnd,
    pub metric: Levels<Metric>,
    pub levels: LevelFlags,
    // Administrative status.
    pub up: bool,
    pub protection: ProtectionType,
    // Edge in the opposite direction.
    pub inverse: Option<EdgeIndex>,
    pub edge_type: EdgeType,
}

// Interface endpoint of an edge.
#[derive(Clone, Debug, Eq, new, PartialEq)]
pub struct EdgeEnd {
    // Owning node.
    pub node: NodeIndex,
    // Interface name.
    pub ifname: String,
    // Interface address.
    pub prefix: Option<IpNetwork>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum EdgeType {
    // Point-to-point or LAN unicast link.
    Unicast,
    // Logical adjacency over an LSP.
    Lsp,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtectionType {
    #[default]
    None,
    Link,
    LinkAndNode,
}

// ===== impl Edge =====

impl Edge {
    pub(crate) fn new(
        index: EdgeIndex,
        from: EdgeEnd,
        to: EdgeEnd,
        metric: Levels<Metric>,
        levels: LevelFlags,
        edge_type: EdgeType,
    ) -> Edge {
        Edge {
            index,
            from,
            to,
            metric,
            levels,
            up: true,
            protection: ProtectionType::None,
            inverse: None,
            edge_type,
        }
    }

    // Returns whether the edge can be used at the given level.
    pub fn is_active(&self, level: LevelNumber) -> bool {
        self.up && self.levels.has_level(level)
    }

    pub fn metric(&self, level: LevelNumber) -> Metric {
        *self.metric.get(level)
    }

    // Returns the address of the remote interface, used as the gateway of
    // next hops going through this edge.
    pub fn gateway(&self) -> Option<IpAddr> {
        self.to.prefix.map(|prefix| prefix.ip())
    }

    // Returns the kind of next hops having this edge as outgoing interface.
    pub fn nexthop_kind(&self) -> NexthopKind {
        match self.edge_type {
            EdgeType::Unicast => NexthopKind::Ip,
            EdgeType::Lsp => NexthopKind::Lsp,
        }
    }

    pub fn is_protected(&self) -> bool {
        self.protection != ProtectionType::None
    }

    pub fn is_node_protected(&self) -> bool {
        self.protection == ProtectionType::LinkAndNode
    }
}

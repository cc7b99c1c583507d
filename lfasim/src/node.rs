//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::collections::{EdgeIndex, NodeIndex};
use crate::level::{LevelNumber, LevelType, Levels};
use crate::num::{INFINITE_METRIC, Metric};
use crate::route::Rib;
use crate::spf::{NexthopKinds, NexthopSet, SpfResult, SpfResultList};

#[derive(Debug)]
pub struct Node {
    // Node arena index.
    pub index: NodeIndex,
    // Node name.
    pub name: String,
    // Router ID (unspecified for pseudo-nodes).
    pub router_id: Ipv4Addr,
    // Area address.
    pub area: Option<String>,
    // Levels the node participates in.
    pub level_type: LevelType,
    // Per-level node type.
    pub node_type: Levels<NodeType>,
    // Per-level overload bit.
    pub overload: Levels<bool>,
    // Whether this L1/L2 router advertises the attached bit in its L1 LSP.
    pub attached: bool,
    // Loopback and stub prefixes advertised by the node.
    pub prefixes: Vec<IpNetwork>,
    // Outgoing edges.
    pub edges: Vec<EdgeIndex>,
    // Per-level SPF computation state.
    pub spf: Levels<NodeSpfState>,
    // Per-level routing table, populated when the node is an SPF root.
    pub rib: Levels<Rib>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum NodeType {
    NonPseudonode,
    Pseudonode,
}

// Transient SPF state of a node, scoped to a single level.
//
// Everything but the result list, the self-result cache and the version
// counter is scratch space owned by whichever SPF run is currently executing.
#[derive(Debug)]
pub struct NodeSpfState {
    // Tentative distance from the active SPF root.
    pub metric: Metric,
    // Next hops accumulated on the way from the active SPF root.
    pub nexthops: NexthopKinds<NexthopSet>,
    // One-hop next hops used to seed ECMP for nodes adjacent to the root,
    // either directly or through a pseudo-node.
    pub direct_nexthops: NexthopKinds<NexthopSet>,
    // Whether the node is currently a member of the candidate tree.
    pub on_heap: bool,
    // Result of the last SPF run rooted at this node.
    pub results: SpfResultList,
    // Results describing this node, keyed by the root that computed them.
    pub self_results: BTreeMap<NodeIndex, SpfResult>,
    // Number of full SPF runs rooted at this node.
    pub version: u32,
}

// ===== impl Node =====

impl Node {
    pub(crate) fn new(
        index: NodeIndex,
        name: String,
        node_type: NodeType,
        level_type: LevelType,
    ) -> Node {
        Node {
            index,
            name,
            router_id: Ipv4Addr::UNSPECIFIED,
            area: None,
            level_type,
            node_type: Levels::both(node_type),
            overload: Default::default(),
            attached: false,
            prefixes: Default::default(),
            edges: Default::default(),
            spf: Default::default(),
            rib: Default::default(),
        }
    }

    pub fn is_pseudonode(&self, level: LevelNumber) -> bool {
        *self.node_type.get(level) == NodeType::Pseudonode
    }

    pub fn is_overloaded(&self, level: LevelNumber) -> bool {
        *self.overload.get(level)
    }

    // Returns whether this is an L1/L2 router setting the attached bit.
    pub fn is_attached(&self) -> bool {
        self.attached && self.level_type == LevelType::All
    }

    // Returns the result of the last SPF run rooted at this node.
    pub fn spf_results(&self, level: LevelNumber) -> &SpfResultList {
        &self.spf.get(level).results
    }

    // Returns the result entry for the given destination, if reachable.
    pub fn spf_result(
        &self,
        level: LevelNumber,
        dest: NodeIndex,
    ) -> Option<&SpfResult> {
        self.spf_results(level)
            .iter()
            .find(|result| result.node == dest)
    }
}

// ===== impl NodeSpfState =====

impl NodeSpfState {
    // Resets the scratch state at the start of an SPF run.
    pub(crate) fn reset(&mut self) {
        self.metric = INFINITE_METRIC;
        self.nexthops.clear();
        self.direct_nexthops.clear();
        self.on_heap = false;
    }
}

impl Default for NodeSpfState {
    fn default() -> NodeSpfState {
        NodeSpfState {
            metric: INFINITE_METRIC,
            nexthops: Default::default(),
            direct_nexthops: Default::default(),
            on_heap: false,
            results: Default::default(),
            self_results: Default::default(),
            version: 0,
        }
    }
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeSet, VecDeque};
use std::net::Ipv4Addr;

use derive_new::new;
use itertools::Either;

use crate::collections::{EdgeIndex, Edges, NodeIndex, Nodes};
use crate::debug::Debug;
use crate::edge::{EdgeEnd, EdgeType, ProtectionType};
use crate::error::Error;
use crate::level::{LevelFlags, LevelNumber, LevelType, Levels};
use crate::node::NodeType;
use crate::num::Metric;

// Network graph shared by all computations.
//
// Nodes and edges are created once by the topology builder. Computations only
// touch per-node transient state, except for topology inversion which
// temporarily swaps edge metrics.
#[derive(Debug, Default)]
pub struct Graph {
    pub nodes: Nodes,
    pub edges: Edges,
}

// Neighbor reached from a node, transparently traversing pseudo-nodes.
#[derive(Clone, Copy, Debug, Eq, new, PartialEq)]
pub struct LogicalNeighbor {
    // Neighbor node (never a pseudo-node).
    pub node: NodeIndex,
    // Outgoing edge of the local node.
    pub edge: EdgeIndex,
    // Edge from the pseudo-node to the neighbor, if reached through a LAN.
    pub pn_edge: Option<EdgeIndex>,
}

// Graph whose edge metrics are inverted for one level. The original metrics
// are restored when this guard goes out of scope.
#[derive(Debug)]
pub struct InvertedGraph<'a> {
    graph: &'a mut Graph,
    level: LevelNumber,
}

// ===== impl Graph =====

impl Graph {
    // Adds a router to the graph.
    pub fn add_node(
        &mut self,
        name: &str,
        router_id: Ipv4Addr,
        level_type: LevelType,
    ) -> Result<NodeIndex, Error> {
        let node =
            self.nodes
                .insert(name, NodeType::NonPseudonode, level_type)?;
        node.router_id = router_id;
        Ok(node.index)
    }

    // Adds a pseudo-node representing a LAN segment.
    pub fn add_pseudonode(
        &mut self,
        name: &str,
        level_type: LevelType,
    ) -> Result<NodeIndex, Error> {
        let node = self.nodes.insert(name, NodeType::Pseudonode, level_type)?;
        Ok(node.index)
    }

    // Adds a unidirectional edge.
    pub fn add_edge(
        &mut self,
        from: EdgeEnd,
        to: EdgeEnd,
        metric: Levels<Metric>,
        level_type: LevelType,
        edge_type: EdgeType,
    ) -> Result<EdgeIndex, Error> {
        for end in [&from, &to] {
            if self.nodes.get(end.node).is_none() {
                return Err(Error::NodeIndexNotFound(end.node));
            }
        }
        if self.edge_by_ifname(from.node, &from.ifname).is_some()
            && edge_type == EdgeType::Unicast
        {
            let node = &self.nodes[from.node];
            return Err(Error::DuplicateInterface(
                node.name.clone(),
                from.ifname.clone(),
            ));
        }

        let from_node = from.node;
        let edge_idx = self.edges.insert(
            from,
            to,
            metric,
            LevelFlags::from(level_type),
            edge_type,
        );
        self.nodes[from_node].edges.push(edge_idx);
        Ok(edge_idx)
    }

    // Adds a bidirectional point-to-point link, made of two edges that are
    // each other's inverse.
    pub fn add_link(
        &mut self,
        a: EdgeEnd,
        b: EdgeEnd,
        metric: Metric,
        level_type: LevelType,
    ) -> Result<(EdgeIndex, EdgeIndex), Error> {
        let ab = self.add_edge(
            a.clone(),
            b.clone(),
            Levels::both(metric),
            level_type,
            EdgeType::Unicast,
        )?;
        let ba = self.add_edge(
            b,
            a,
            Levels::both(metric),
            level_type,
            EdgeType::Unicast,
        )?;
        self.edges[ab].inverse = Some(ba);
        self.edges[ba].inverse = Some(ab);
        Ok((ab, ba))
    }

    // Attaches a router to a LAN. The pseudo-node reaches its members at zero
    // cost.
    pub fn add_lan_link(
        &mut self,
        member: EdgeEnd,
        pseudonode: NodeIndex,
        metric: Metric,
        level_type: LevelType,
    ) -> Result<(EdgeIndex, EdgeIndex), Error> {
        let member_name = self
            .nodes
            .get(member.node)
            .map(|node| node.name.clone())
            .ok_or(Error::NodeIndexNotFound(member.node))?;
        let pn_name = self
            .nodes
            .get(pseudonode)
            .map(|node| node.name.clone())
            .ok_or(Error::NodeIndexNotFound(pseudonode))?;
        let pn_ifname = format!("{pn_name}-{member_name}");
        let pn_end = EdgeEnd::new(pseudonode, pn_ifname, None);
        let to_pn = self.add_edge(
            member.clone(),
            pn_end.clone(),
            Levels::both(metric),
            level_type,
            EdgeType::Unicast,
        )?;
        let from_pn = self.add_edge(
            pn_end,
            member,
            Levels::both(0),
            level_type,
            EdgeType::Unicast,
        )?;
        self.edges[to_pn].inverse = Some(from_pn);
        self.edges[from_pn].inverse = Some(to_pn);
        Ok((to_pn, from_pn))
    }

    // Adds a unidirectional logical adjacency over an LSP.
    pub fn add_lsp_adjacency(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        ifname: &str,
        metric: Metric,
        level_type: LevelType,
    ) -> Result<EdgeIndex, Error> {
        let to_ifname = format!("{ifname}-tail");
        self.add_edge(
            EdgeEnd::new(from, ifname.to_owned(), None),
            EdgeEnd::new(to, to_ifname, None),
            Levels::both(metric),
            level_type,
            EdgeType::Lsp,
        )
    }

    pub fn set_metric(
        &mut self,
        edge_idx: EdgeIndex,
        level: LevelNumber,
        metric: Metric,
    ) {
        *self.edges[edge_idx].metric.get_mut(level) = metric;
    }

    pub fn set_overload(
        &mut self,
        node_idx: NodeIndex,
        level: LevelNumber,
        overload: bool,
    ) {
        *self.nodes[node_idx].overload.get_mut(level) = overload;
    }

    // Changes the administrative status of an edge and of its inverse.
    pub fn set_link_status(&mut self, edge_idx: EdgeIndex, up: bool) {
        self.edges[edge_idx].up = up;
        if let Some(inverse) = self.edges[edge_idx].inverse {
            self.edges[inverse].up = up;
        }
    }

    pub fn set_protection(
        &mut self,
        edge_idx: EdgeIndex,
        protection: ProtectionType,
    ) {
        self.edges[edge_idx].protection = protection;
    }

    // Looks up an outgoing edge by interface name.
    pub fn edge_by_ifname(
        &self,
        node_idx: NodeIndex,
        ifname: &str,
    ) -> Option<EdgeIndex> {
        self.nodes.get(node_idx).and_then(|node| {
            node.edges
                .iter()
                .copied()
                .find(|edge_idx| self.edges[*edge_idx].from.ifname == ifname)
        })
    }

    // Returns an iterator over the neighbors reachable through active edges of
    // the given level, along with the edge used to reach them.
    pub fn physical_neighbors(
        &self,
        node_idx: NodeIndex,
        level: LevelNumber,
    ) -> impl Iterator<Item = (NodeIndex, EdgeIndex)> + '_ {
        self.nodes[node_idx]
            .edges
            .iter()
            .copied()
            .filter(move |edge_idx| self.edges[*edge_idx].is_active(level))
            .map(move |edge_idx| (self.edges[edge_idx].to.node, edge_idx))
    }

    // Returns an iterator over the neighbors of the given node, where the
    // members of an attached LAN are reported in place of its pseudo-node.
    pub fn logical_neighbors(
        &self,
        node_idx: NodeIndex,
        level: LevelNumber,
    ) -> impl Iterator<Item = LogicalNeighbor> + '_ {
        self.physical_neighbors(node_idx, level).flat_map(
            move |(nbr_idx, edge_idx)| {
                if self.nodes[nbr_idx].is_pseudonode(level) {
                    Either::Left(
                        self.physical_neighbors(nbr_idx, level)
                            .filter(move |(member_idx, _)| {
                                *member_idx != node_idx
                            })
                            .map(move |(member_idx, pn_edge_idx)| {
                                LogicalNeighbor::new(
                                    member_idx,
                                    edge_idx,
                                    Some(pn_edge_idx),
                                )
                            }),
                    )
                } else {
                    Either::Right(std::iter::once(LogicalNeighbor::new(
                        nbr_idx, edge_idx, None,
                    )))
                }
            },
        )
    }

    // Returns whether the neighbor has an active edge back to the node.
    pub fn is_two_way_nbr(
        &self,
        node_idx: NodeIndex,
        nbr_idx: NodeIndex,
        level: LevelNumber,
    ) -> bool {
        self.physical_neighbors(nbr_idx, level)
            .any(|(node, edge_idx)| {
                node == node_idx
                    && self.edges[edge_idx].edge_type == EdgeType::Unicast
            })
    }

    // Returns all nodes reachable from the given root through active edges of
    // the given level, including the root itself.
    pub fn reachable_nodes(
        &self,
        root: NodeIndex,
        level: LevelNumber,
    ) -> BTreeSet<NodeIndex> {
        let mut visited = BTreeSet::from([root]);
        let mut queue = VecDeque::from([root]);
        while let Some(node_idx) = queue.pop_front() {
            for (nbr_idx, _) in self.physical_neighbors(node_idx, level) {
                if visited.insert(nbr_idx) {
                    queue.push_back(nbr_idx);
                }
            }
        }
        visited
    }

    // Swaps the metric of every edge of the given level with the metric of its
    // inverse. Applying the inversion twice restores the original metrics.
    pub fn invert_topology(&mut self, level: LevelNumber) {
        Debug::TopologyInvert(level).log();

        let pairs = self
            .edges
            .iter()
            .filter(|edge| edge.levels.has_level(level))
            .filter_map(|edge| edge.inverse.map(|inverse| (edge.index, inverse)))
            .filter(|(edge_idx, inverse)| edge_idx < inverse)
            .collect::<Vec<_>>();
        for (edge_idx, inverse) in pairs {
            if !self.edges[inverse].levels.has_level(level) {
                continue;
            }
            let metric = self.edges[edge_idx].metric(level);
            let inverse_metric = self.edges[inverse].metric(level);
            self.set_metric(edge_idx, level, inverse_metric);
            self.set_metric(inverse, level, metric);
        }
    }

    // Inverts the topology for the lifetime of the returned guard.
    pub fn inverted(&mut self, level: LevelNumber) -> InvertedGraph<'_> {
        self.invert_topology(level);
        InvertedGraph { graph: self, level }
    }
}

// ===== impl InvertedGraph =====

impl std::ops::Deref for InvertedGraph<'_> {
    type Target = Graph;

    fn deref(&self) -> &Graph {
        self.graph
    }
}

impl std::ops::DerefMut for InvertedGraph<'_> {
    fn deref_mut(&mut self) -> &mut Graph {
        self.graph
    }
}

impl Drop for InvertedGraph<'_> {
    fn drop(&mut self) {
        self.graph.invert_topology(self.level);
    }
}

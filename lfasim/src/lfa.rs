//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Loop-Free Alternates (RFC 5286).
//!
//! For a protected edge S->E, every neighbor N of the computing node S is
//! evaluated against each destination D whose primary path uses the edge:
//!
//! * Inequality 1 (loop-free): `D(N,D) < D(N,S) + D(S,D)`
//! * Inequality 2 (downstream): `D(N,D) < D(S,D)`
//! * Inequality 3 (node protection): `D(N,D) < D(N,E) + D(E,D)`, for every
//!   primary next hop E of D
//! * Inequality 4 (broadcast links): `D(N,D) < D(N,PN) + D(PN,D)`
//!
//! On point-to-point links, the neighbor reached through the protected edge
//! is never a candidate. On broadcast links, the other members of the
//! protected LAN are reached through the LAN itself, so they can only protect
//! against the failure of the primary next-hop node.

use std::collections::BTreeSet;

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::collections::{EdgeIndex, NodeIndex};
use crate::debug::Debug;
use crate::distance::{compute_distances, distance};
use crate::edge::EdgeType;
use crate::error::Error;
use crate::graph::Graph;
use crate::level::LevelNumber;
use crate::num::{INFINITE_METRIC, Metric, metric_add};
use crate::spf::{Nexthop, SpfContext};

// Protection offered by an alternate, from the weakest to the strongest
// within each family.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LfaType {
    LinkProtection,
    LinkProtectionDownstream,
    LinkAndNodeProtection,
    BroadcastLinkProtection,
    BroadcastLinkProtectionDownstream,
    BroadcastLinkAndNodeProtection,
    BroadcastOnlyNodeProtection,
    RemoteLinkProtection,
    RemoteLinkProtectionDownstream,
    RemoteLinkAndNodeProtection,
}

// Backup path for a single destination.
#[derive(Clone, Debug, Eq, new, PartialEq)]
pub struct LfaAlternate {
    // Alternate node: the neighbor itself, or the remote repair node.
    pub node: NodeIndex,
    pub destination: NodeIndex,
    // Neighbor and interface used to send traffic to the alternate node.
    pub nexthop: Nexthop,
    pub lfa_type: LfaType,
    // Total cost of the backup path.
    pub metric: Metric,
}

// Alternates computed for a protected edge.
#[derive(Clone, Debug, new)]
pub struct LfaRecord {
    pub protected_edge: EdgeIndex,
    pub level: LevelNumber,
    #[new(default)]
    pub alternates: Vec<LfaAlternate>,
}

// Destination whose primary path uses the protected edge.
#[derive(Clone, Debug)]
pub(crate) struct AffectedDestination {
    pub node: NodeIndex,
    pub metric: Metric,
    // Primary next-hop nodes over the protected edge.
    pub primary_nodes: Vec<NodeIndex>,
    // Whether the destination has more than one primary next hop.
    pub ecmp: bool,
}

// ===== impl LfaType =====

impl LfaType {
    pub fn is_node_protecting(&self) -> bool {
        matches!(
            self,
            LfaType::LinkAndNodeProtection
                | LfaType::BroadcastLinkAndNodeProtection
                | LfaType::BroadcastOnlyNodeProtection
                | LfaType::RemoteLinkAndNodeProtection
        )
    }

    pub fn is_downstream(&self) -> bool {
        matches!(
            self,
            LfaType::LinkProtectionDownstream
                | LfaType::BroadcastLinkProtectionDownstream
                | LfaType::RemoteLinkProtectionDownstream
        )
    }

    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            LfaType::RemoteLinkProtection
                | LfaType::RemoteLinkProtectionDownstream
                | LfaType::RemoteLinkAndNodeProtection
        )
    }

    // Selects the type of a point-to-point alternate.
    fn p2p(node_protection: bool, downstream: bool) -> LfaType {
        if node_protection {
            LfaType::LinkAndNodeProtection
        } else if downstream {
            LfaType::LinkProtectionDownstream
        } else {
            LfaType::LinkProtection
        }
    }

    // Selects the type of a broadcast alternate, if any.
    fn broadcast(
        node_protection: bool,
        downstream: bool,
        avoids_pseudonode: bool,
    ) -> Option<LfaType> {
        match (avoids_pseudonode, node_protection, downstream) {
            (true, true, _) => Some(LfaType::BroadcastLinkAndNodeProtection),
            (true, false, true) => {
                Some(LfaType::BroadcastLinkProtectionDownstream)
            }
            (true, false, false) => Some(LfaType::BroadcastLinkProtection),
            (false, true, _) => Some(LfaType::BroadcastOnlyNodeProtection),
            (false, false, _) => None,
        }
    }

    // Selects the type of a remote alternate.
    pub(crate) fn remote(node_protection: bool, downstream: bool) -> LfaType {
        if node_protection {
            LfaType::RemoteLinkAndNodeProtection
        } else if downstream {
            LfaType::RemoteLinkProtectionDownstream
        } else {
            LfaType::RemoteLinkProtection
        }
    }
}

impl std::fmt::Display for LfaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LfaType::LinkProtection => "link-protection",
            LfaType::LinkProtectionDownstream => "link-protection-downstream",
            LfaType::LinkAndNodeProtection => "link-and-node-protection",
            LfaType::BroadcastLinkProtection => "broadcast-link-protection",
            LfaType::BroadcastLinkProtectionDownstream => {
                "broadcast-link-protection-downstream"
            }
            LfaType::BroadcastLinkAndNodeProtection => {
                "broadcast-link-and-node-protection"
            }
            LfaType::BroadcastOnlyNodeProtection => {
                "broadcast-only-node-protection"
            }
            LfaType::RemoteLinkProtection => "remote-link-protection",
            LfaType::RemoteLinkProtectionDownstream => {
                "remote-link-protection-downstream"
            }
            LfaType::RemoteLinkAndNodeProtection => {
                "remote-link-and-node-protection"
            }
        };
        write!(f, "{name}")
    }
}

// ===== impl LfaRecord =====

impl LfaRecord {
    // Returns all alternates protecting the given destination.
    pub fn alternates_for(
        &self,
        destination: NodeIndex,
    ) -> impl Iterator<Item = &LfaAlternate> + '_ {
        self.alternates
            .iter()
            .filter(move |alt| alt.destination == destination)
    }

    // Returns the protected destinations.
    pub fn destinations(&self) -> BTreeSet<NodeIndex> {
        self.alternates.iter().map(|alt| alt.destination).collect()
    }

    // Returns the preferred alternate for the given destination.
    //
    // Node-protecting alternates win over link-only ones, then downstream
    // alternates, then the lowest total metric.
    pub fn best_alternate(
        &self,
        destination: NodeIndex,
    ) -> Option<&LfaAlternate> {
        self.alternates_for(destination).min_by_key(|alt| {
            (
                !alt.lfa_type.is_node_protecting(),
                !alt.lfa_type.is_downstream(),
                alt.metric,
            )
        })
    }
}

// ===== global functions =====

// Computes the loop-free alternates protecting the given edge of the root.
//
// Returns `None` when the edge isn't configured for protection or when no
// alternate exists.
pub fn compute_lfa(
    ctx: &mut SpfContext,
    graph: &mut Graph,
    root: NodeIndex,
    protected_edge: EdgeIndex,
    level: LevelNumber,
    strict_downstream: bool,
) -> Result<Option<LfaRecord>, Error> {
    if !check_protected_edge(graph, root, protected_edge, level)? {
        return Ok(None);
    }
    Debug::LfaStart(&graph.edges[protected_edge], level).log();

    let edge = &graph.edges[protected_edge];
    let far_end = edge.to.node;
    let node_protection = edge.is_node_protected();
    let broadcast = graph.nodes[far_end].is_pseudonode(level);

    // Compute the distances from the root and from the far end.
    compute_distances(ctx, graph, root, level)?;
    compute_distances(ctx, graph, far_end, level)?;
    let affected = affected_destinations(graph, root, protected_edge, level);
    if affected.is_empty() {
        return Ok(None);
    }

    // Collect candidate neighbors and compute their distances.
    let candidates = graph
        .logical_neighbors(root, level)
        .filter(|nbr| broadcast || nbr.edge != protected_edge)
        .filter(|nbr| nbr.node != root)
        .filter(|nbr| !graph.nodes[nbr.node].is_overloaded(level))
        .map(|nbr| {
            let edge = &graph.edges[nbr.edge];
            let gateway = match nbr.pn_edge {
                Some(pn_edge) => graph.edges[pn_edge].gateway(),
                None => edge.gateway(),
            };
            Nexthop::new(nbr.node, nbr.edge, gateway)
        })
        .collect::<Vec<_>>();
    let mut computed = BTreeSet::new();
    for candidate in &candidates {
        if computed.insert(candidate.node) {
            compute_distances(ctx, graph, candidate.node, level)?;
        }
    }

    let mut record = LfaRecord::new(protected_edge, level);
    for dest in &affected {
        let mut found = false;
        for candidate in &candidates {
            let nbr = candidate.node;
            let dist_root_nbr = distance(graph, root, nbr, level)?;
            if dist_root_nbr == INFINITE_METRIC {
                continue;
            }
            let dist_nbr_dest = distance(graph, nbr, dest.node, level)?;
            let dist_nbr_root = distance(graph, nbr, root, level)?;

            // Inequality 1: loop-free.
            if dist_nbr_dest >= metric_add(dist_nbr_root, dest.metric) {
                continue;
            }

            // Inequality 2: downstream path.
            let downstream = dist_nbr_dest < dest.metric;
            if strict_downstream && !downstream {
                continue;
            }

            // Inequality 3: node protection.
            let node_protecting = node_protection
                && is_node_protecting(graph, nbr, dest, dist_nbr_dest, level)?;

            let lfa_type = if broadcast {
                // Inequality 4: the alternate path avoids the LAN. Traffic
                // toward a member of the protected LAN always crosses it.
                let avoids_pseudonode = candidate.oif != protected_edge
                    && dist_nbr_dest
                        < metric_add(
                            distance(graph, nbr, far_end, level)?,
                            distance(graph, far_end, dest.node, level)?,
                        );
                match LfaType::broadcast(
                    node_protecting,
                    downstream,
                    avoids_pseudonode,
                ) {
                    Some(lfa_type) => lfa_type,
                    None => continue,
                }
            } else {
                LfaType::p2p(node_protecting, downstream)
            };

            // A link failure can't take out all primary paths of an ECMP
            // destination.
            if dest.ecmp && !lfa_type.is_node_protecting() {
                continue;
            }

            Debug::LfaFound(
                &graph.nodes[dest.node],
                &graph.nodes[nbr],
                lfa_type,
            )
            .log();
            let metric = metric_add(dist_root_nbr, dist_nbr_dest);
            record.alternates.push(LfaAlternate::new(
                nbr, dest.node, *candidate, lfa_type, metric,
            ));
            found = true;
        }
        if !found {
            Debug::LfaNotFound(&graph.nodes[dest.node]).log();
        }
    }

    if record.alternates.is_empty() {
        return Ok(None);
    }
    Ok(Some(record))
}

// Validates the protected edge. Returns whether protection is enabled on it.
pub(crate) fn check_protected_edge(
    graph: &Graph,
    root: NodeIndex,
    protected_edge: EdgeIndex,
    level: LevelNumber,
) -> Result<bool, Error> {
    let root_node =
        graph.nodes.get(root).ok_or(Error::NodeIndexNotFound(root))?;
    let edge = graph
        .edges
        .get(protected_edge)
        .ok_or(Error::EdgeIndexNotFound(protected_edge))?;

    if root_node.is_pseudonode(level) {
        return Err(Error::SpfRootPseudonode(root_node.name.clone(), level));
    }
    if root_node.is_overloaded(level) {
        return Err(Error::SpfRootOverloaded(root_node.name.clone(), level));
    }
    if edge.from.node != root {
        return Err(Error::ProtectedEdgeNotLocal(
            root_node.name.clone(),
            edge.from.ifname.clone(),
        ));
    }
    assert!(
        edge.edge_type == EdgeType::Unicast,
        "protected edge {} isn't a unicast edge",
        edge.from.ifname
    );
    if !edge.is_active(level) {
        return Err(Error::ProtectedEdgeInactive(
            root_node.name.clone(),
            edge.from.ifname.clone(),
            level,
        ));
    }

    Ok(edge.is_protected())
}

// Returns the destinations of the root whose primary path uses the protected
// edge, in the order of the root's result list.
pub(crate) fn affected_destinations(
    graph: &Graph,
    root: NodeIndex,
    protected_edge: EdgeIndex,
    level: LevelNumber,
) -> Vec<AffectedDestination> {
    graph.nodes[root]
        .spf_results(level)
        .iter()
        .filter(|result| result.node != root)
        .filter(|result| result.nexthops.ip.uses_oif(protected_edge))
        .map(|result| AffectedDestination {
            node: result.node,
            metric: result.metric,
            primary_nodes: result
                .nexthops
                .ip
                .iter()
                .filter(|nexthop| nexthop.oif == protected_edge)
                .map(|nexthop| nexthop.node)
                .collect(),
            ecmp: result.nexthops.ip.len() > 1,
        })
        .collect()
}

// ===== helper functions =====

// Checks inequality 3 against every primary next hop of the destination.
fn is_node_protecting(
    graph: &Graph,
    nbr: NodeIndex,
    dest: &AffectedDestination,
    dist_nbr_dest: Metric,
    level: LevelNumber,
) -> Result<bool, Error> {
    for primary in dest.primary_nodes.iter().copied() {
        if primary == dest.node {
            return Ok(false);
        }
        let dist_nbr_primary = distance(graph, nbr, primary, level)?;
        let dist_primary_dest = distance(graph, primary, dest.node, level)?;
        if dist_nbr_dest >= metric_add(dist_nbr_primary, dist_primary_dest) {
            return Ok(false);
        }
    }
    Ok(true)
}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfa_type_selection() {
        assert_eq!(LfaType::p2p(true, true), LfaType::LinkAndNodeProtection);
        assert_eq!(
            LfaType::p2p(false, true),
            LfaType::LinkProtectionDownstream
        );
        assert_eq!(LfaType::p2p(false, false), LfaType::LinkProtection);

        assert_eq!(
            LfaType::broadcast(true, false, true),
            Some(LfaType::BroadcastLinkAndNodeProtection)
        );
        assert_eq!(
            LfaType::broadcast(false, true, true),
            Some(LfaType::BroadcastLinkProtectionDownstream)
        );
        assert_eq!(
            LfaType::broadcast(false, false, true),
            Some(LfaType::BroadcastLinkProtection)
        );
        assert_eq!(
            LfaType::broadcast(true, true, false),
            Some(LfaType::BroadcastOnlyNodeProtection)
        );
        assert_eq!(LfaType::broadcast(false, true, false), None);

        assert_eq!(
            LfaType::remote(false, true),
            LfaType::RemoteLinkProtectionDownstream
        );
    }

    #[test]
    fn test_lfa_type_properties() {
        assert!(LfaType::BroadcastOnlyNodeProtection.is_node_protecting());
        assert!(!LfaType::BroadcastOnlyNodeProtection.is_downstream());
        assert!(LfaType::RemoteLinkProtection.is_remote());
        assert!(!LfaType::LinkProtectionDownstream.is_remote());
        assert_eq!(
            LfaType::RemoteLinkAndNodeProtection.to_string(),
            "remote-link-and-node-protection"
        );
    }
}

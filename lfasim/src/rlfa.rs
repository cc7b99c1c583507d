//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Remote Loop-Free Alternates (RFC 7490).
//!
//! Repair nodes are searched in the intersection of the extended P-space of
//! the computing node S (nodes reachable from S, or from one of its
//! neighbors, without crossing the protected link S->E) and the Q-space of
//! the far end E (nodes from which E is reachable without going back through
//! S). The Q-space is computed with reverse SPF runs over the inverted
//! topology.

use std::collections::{BTreeMap, BTreeSet};

use derive_new::new;

use crate::collections::{EdgeIndex, NodeIndex};
use crate::debug::Debug;
use crate::distance::{compute_distances, distance};
use crate::error::Error;
use crate::graph::Graph;
use crate::level::LevelNumber;
use crate::lfa::{
    self, LfaAlternate, LfaRecord, LfaType, affected_destinations,
    check_protected_edge,
};
use crate::num::{INFINITE_METRIC, Metric, metric_add};
use crate::spf::{self, Nexthop, SpfContext, SpfRunKind};

// Member of the (extended) P-space.
#[derive(Clone, Copy, Debug, Eq, new, PartialEq)]
pub struct PSpaceEntry {
    // Next hop used to reach the node.
    pub nexthop: Nexthop,
    // Whether the path to the node also avoids the far end of the protected
    // link.
    pub node_protecting: bool,
}

pub type PSpace = BTreeMap<NodeIndex, PSpaceEntry>;

// ===== global functions =====

// Computes the P-space of the root with respect to the protected edge: the
// nodes the root reaches without crossing the edge.
//
// The root and far end distances must have been computed beforehand.
pub fn p_space(
    graph: &Graph,
    root: NodeIndex,
    protected_edge: EdgeIndex,
    level: LevelNumber,
) -> Result<PSpace, Error> {
    let far_end = graph.edges[protected_edge].to.node;
    let dist_root_far_end = distance(graph, root, far_end, level)?;

    let mut space = PSpace::new();
    for result in graph.nodes[root].spf_results(level) {
        let node = &graph.nodes[result.node];
        if result.node == root || node.is_overloaded(level) {
            continue;
        }

        let dist_far_end_node = distance(graph, far_end, result.node, level)?;
        if result.metric >= metric_add(dist_root_far_end, dist_far_end_node) {
            continue;
        }

        // The shortest path avoids the far end altogether.
        let Some(nexthop) = result
            .nexthops
            .ip
            .iter()
            .find(|nexthop| nexthop.oif != protected_edge)
        else {
            continue;
        };
        let node_protecting = result.node != far_end;
        space.insert(result.node, PSpaceEntry::new(*nexthop, node_protecting));
    }

    Ok(space)
}

// Computes the extended P-space of the root: its P-space, plus the P-spaces
// of the neighbors that don't use the protected edge to reach the root.
pub fn extended_p_space(
    ctx: &mut SpfContext,
    graph: &mut Graph,
    root: NodeIndex,
    protected_edge: EdgeIndex,
    level: LevelNumber,
) -> Result<PSpace, Error> {
    let far_end = graph.edges[protected_edge].to.node;
    compute_distances(ctx, graph, root, level)?;
    compute_distances(ctx, graph, far_end, level)?;

    let mut space = p_space(graph, root, protected_edge, level)?;
    let dist_root_far_end = distance(graph, root, far_end, level)?;

    // Select the neighbors reached without crossing the protected edge.
    let mut neighbors = vec![];
    for nbr in graph.logical_neighbors(root, level) {
        if nbr.node == far_end
            || nbr.edge == protected_edge
            || graph.nodes[nbr.node].is_overloaded(level)
        {
            continue;
        }
        let dist_root_nbr = distance(graph, root, nbr.node, level)?;
        let dist_far_end_nbr = distance(graph, far_end, nbr.node, level)?;
        if dist_root_nbr == INFINITE_METRIC
            || dist_root_nbr >= metric_add(dist_root_far_end, dist_far_end_nbr)
        {
            continue;
        }
        let gateway = match nbr.pn_edge {
            Some(pn_edge) => graph.edges[pn_edge].gateway(),
            None => graph.edges[nbr.edge].gateway(),
        };
        neighbors.push(Nexthop::new(nbr.node, nbr.edge, gateway));
    }

    for nexthop in neighbors {
        let nbr = nexthop.node;
        compute_distances(ctx, graph, nbr, level)?;
        let dist_nbr_root = distance(graph, nbr, root, level)?;
        let dist_nbr_far_end = distance(graph, nbr, far_end, level)?;

        for result in graph.nodes[nbr].spf_results(level) {
            let node = &graph.nodes[result.node];
            if result.node == root || node.is_overloaded(level) {
                continue;
            }

            // The neighbor reaches the node without going through the root.
            let dist_root_node = distance(graph, root, result.node, level)?;
            if result.metric >= metric_add(dist_nbr_root, dist_root_node) {
                continue;
            }

            let dist_far_end_node =
                distance(graph, far_end, result.node, level)?;
            let node_protecting = result.node != far_end
                && result.metric
                    < metric_add(dist_nbr_far_end, dist_far_end_node);
            let entry = PSpaceEntry::new(nexthop, node_protecting);
            space
                .entry(result.node)
                .and_modify(|current| {
                    if node_protecting && !current.node_protecting {
                        *current = entry;
                    }
                })
                .or_insert(entry);
        }
    }

    Ok(space)
}

// Computes the Q-space of the far end of the protected edge: the nodes from
// which the far end is reachable without going through the root.
//
// Reverse distances are obtained by running SPF over the inverted topology.
// The forward results of the root and of the far end are recomputed
// afterwards, including when a reverse run fails.
pub fn q_space(
    ctx: &mut SpfContext,
    graph: &mut Graph,
    root: NodeIndex,
    protected_edge: EdgeIndex,
    level: LevelNumber,
) -> Result<BTreeSet<NodeIndex>, Error> {
    let far_end = graph.edges[protected_edge].to.node;
    if graph.nodes[far_end].is_overloaded(level) {
        return Ok(Default::default());
    }

    let reverse = {
        let mut inverted = graph.inverted(level);
        reverse_distances(ctx, &mut inverted, far_end, level).and_then(
            |rdist_far_end| {
                let rdist_root =
                    reverse_distances(ctx, &mut inverted, root, level)?;
                Ok((rdist_far_end, rdist_root))
            },
        )
    };

    // The forward results are restored even if a reverse run failed.
    let root_restored = compute_distances(ctx, graph, root, level);
    let far_end_restored = compute_distances(ctx, graph, far_end, level);
    let (rdist_far_end, rdist_root) = reverse?;
    root_restored?;
    far_end_restored?;

    let rdist_far_end_root =
        rdist_far_end.get(&root).copied().unwrap_or(INFINITE_METRIC);
    let space = rdist_far_end
        .iter()
        .filter(|(node_idx, _)| !graph.nodes[**node_idx].is_overloaded(level))
        .filter(|(node_idx, rdist)| {
            let rdist_root_node =
                rdist_root.get(*node_idx).copied().unwrap_or(INFINITE_METRIC);
            **rdist < metric_add(rdist_root_node, rdist_far_end_root)
        })
        .map(|(node_idx, _)| *node_idx)
        .collect();

    Ok(space)
}

// Computes the PQ-space: the members of the extended P-space that also
// belong to the Q-space.
pub fn pq_space(
    ctx: &mut SpfContext,
    graph: &mut Graph,
    root: NodeIndex,
    protected_edge: EdgeIndex,
    level: LevelNumber,
) -> Result<PSpace, Error> {
    let mut space =
        extended_p_space(ctx, graph, root, protected_edge, level)?;
    let q_space = q_space(ctx, graph, root, protected_edge, level)?;
    space.retain(|node_idx, _| q_space.contains(node_idx));
    Ok(space)
}

// Computes the remote loop-free alternates protecting the given edge of the
// root. Only point-to-point edges are supported.
//
// Returns `None` when the edge isn't configured for protection or when no
// alternate exists.
pub fn compute_rlfa(
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

    let edge = &graph.edges[protected_edge];
    let far_end = edge.to.node;
    if graph.nodes[far_end].is_pseudonode(level) {
        Debug::RlfaUnsupportedBroadcast(edge).log();
        return Ok(None);
    }
    let node_protection = edge.is_node_protected();

    let pq_space = pq_space(ctx, graph, root, protected_edge, level)?;
    Debug::RlfaPqSpace(&graph.edges[protected_edge], pq_space.len()).log();
    let affected = affected_destinations(graph, root, protected_edge, level);
    if pq_space.is_empty() || affected.is_empty() {
        return Ok(None);
    }

    let mut record = LfaRecord::new(protected_edge, level);
    for (pq_node, entry) in &pq_space {
        spf::run_spf(ctx, graph, *pq_node, level, SpfRunKind::Forward)?;
        let dist_root_pq = distance(graph, root, *pq_node, level)?;
        let dist_pq_root = distance(graph, *pq_node, root, level)?;
        let dist_pq_far_end = distance(graph, *pq_node, far_end, level)?;

        for dest in &affected {
            let dist_pq_dest = distance(graph, *pq_node, dest.node, level)?;

            // The repair node reaches the destination without looping back.
            if dist_pq_dest >= metric_add(dist_pq_root, dest.metric) {
                continue;
            }

            let downstream = dist_pq_dest < dest.metric;
            if strict_downstream && !downstream {
                continue;
            }

            let node_protecting = node_protection
                && entry.node_protecting
                && dest.node != far_end
                && dist_pq_dest
                    < metric_add(
                        dist_pq_far_end,
                        distance(graph, far_end, dest.node, level)?,
                    );
            let lfa_type = LfaType::remote(node_protecting, downstream);
            if dest.ecmp && !lfa_type.is_node_protecting() {
                continue;
            }

            Debug::LfaFound(
                &graph.nodes[dest.node],
                &graph.nodes[*pq_node],
                lfa_type,
            )
            .log();
            let metric = metric_add(dist_root_pq, dist_pq_dest);
            record.alternates.push(LfaAlternate::new(
                *pq_node,
                dest.node,
                entry.nexthop,
                lfa_type,
                metric,
            ));
        }
    }

    if record.alternates.is_empty() {
        return Ok(None);
    }
    Ok(Some(record))
}

// Computes both kinds of alternates for the given edge of the root. Remote
// alternates are only searched for the destinations left unprotected by the
// local ones.
pub fn compute_backups(
    ctx: &mut SpfContext,
    graph: &mut Graph,
    root: NodeIndex,
    protected_edge: EdgeIndex,
    level: LevelNumber,
) -> Result<Option<LfaRecord>, Error> {
    let strict_downstream = ctx.config.strict_downstream;
    let lfa = lfa::compute_lfa(
        ctx,
        graph,
        root,
        protected_edge,
        level,
        strict_downstream,
    )?;
    if !ctx.config.rlfa_enabled {
        return Ok(lfa);
    }

    let covered = lfa
        .as_ref()
        .map(|record| record.destinations())
        .unwrap_or_default();
    let rlfa = compute_rlfa(
        ctx,
        graph,
        root,
        protected_edge,
        level,
        strict_downstream,
    )?;

    let mut record =
        lfa.unwrap_or_else(|| LfaRecord::new(protected_edge, level));
    if let Some(rlfa) = rlfa {
        record.alternates.extend(
            rlfa.alternates
                .into_iter()
                .filter(|alt| !covered.contains(&alt.destination)),
        );
    }

    if record.alternates.is_empty() {
        return Ok(None);
    }
    Ok(Some(record))
}

// ===== helper functions =====

// Runs SPF over the inverted topology and returns the reverse distances from
// all nodes toward the given one.
fn reverse_distances(
    ctx: &mut SpfContext,
    graph: &mut Graph,
    node_idx: NodeIndex,
    level: LevelNumber,
) -> Result<BTreeMap<NodeIndex, Metric>, Error> {
    let results =
        spf::run_spf(ctx, graph, node_idx, level, SpfRunKind::Forward)?;
    Ok(results
        .iter()
        .map(|result| (result.node, result.metric))
        .collect())
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::VecDeque;
use std::net::IpAddr;
use std::time::Instant;

use derive_new::new;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::candidate::CandidateTree;
use crate::collections::{EdgeIndex, NodeIndex};
use crate::config::SpfConfig;
use crate::debug::Debug;
use crate::edge::EdgeType;
use crate::error::Error;
use crate::graph::Graph;
use crate::level::{LevelNumber, Levels};
use crate::num::{INFINITE_METRIC, Metric, metric_add};
use crate::route;

// Maximum number of equal-cost next hops kept per destination.
pub const MAX_NEXTHOPS: usize = 4;

// Route nexthop.
#[derive(Clone, Copy, Debug, Eq, new, PartialEq)]
pub struct Nexthop {
    // Physical neighbor the traffic is handed to.
    pub node: NodeIndex,
    // Outgoing edge of the SPF root.
    pub oif: EdgeIndex,
    // Address of the neighbor's interface.
    pub gateway: Option<IpAddr>,
}

// Ordered, duplicate-free set of equal-cost next hops.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NexthopSet(SmallVec<[Nexthop; MAX_NEXTHOPS]>);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum NexthopKind {
    // Next hop over a unicast adjacency.
    Ip,
    // Next hop over an LSP adjacency.
    Lsp,
}

// Container for storing separate values for each nexthop kind.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NexthopKinds<T> {
    pub ip: T,
    pub lsp: T,
}

// Destination reached by an SPF run.
#[derive(Clone, Debug, Eq, new, PartialEq)]
pub struct SpfResult {
    pub node: NodeIndex,
    pub metric: Metric,
    pub nexthops: NexthopKinds<NexthopSet>,
}

pub type SpfResultList = Vec<SpfResult>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum SpfRunKind {
    // Recompute the shortest-path tree and the root's routing table.
    Full,
    // Recompute the shortest-path tree only, for distance queries.
    Forward,
    // Rebuild the root's routing table from the cached shortest-path tree.
    PartialRouteCompute,
}

#[derive(Debug, new)]
pub struct SpfLogEntry {
    pub id: u32,
    pub root: NodeIndex,
    pub level: LevelNumber,
    pub kind: SpfRunKind,
    pub start_time: Instant,
    pub end_time: Instant,
    // Number of non-pseudo-node destinations found.
    pub reachable: usize,
}

// State shared by all SPF runs: the reusable candidate tree, the SPF log and
// run statistics. Runs are serialized through the `&mut` borrow of the context
// and of the graph.
#[derive(Debug)]
pub struct SpfContext {
    pub config: SpfConfig,
    pub(crate) cand_tree: CandidateTree<NodeIndex>,
    pub spf_log: VecDeque<SpfLogEntry>,
    pub spf_log_next_id: u32,
    pub spf_run_count: Levels<u64>,
}

// ===== impl NexthopSet =====

impl NexthopSet {
    // Adds a nexthop, ignoring duplicates and nexthops exceeding the maximum
    // ECMP width. Returns whether the set was modified.
    pub fn insert(&mut self, nexthop: Nexthop) -> bool {
        if self.0.contains(&nexthop) || self.0.len() >= MAX_NEXTHOPS {
            return false;
        }
        self.0.push(nexthop);
        true
    }

    pub fn extend(&mut self, other: &NexthopSet) {
        for nexthop in other.iter() {
            self.insert(*nexthop);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Nexthop> + '_ {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    // Returns whether any nexthop leaves through the given edge.
    pub fn uses_oif(&self, oif: EdgeIndex) -> bool {
        self.0.iter().any(|nexthop| nexthop.oif == oif)
    }
}

impl FromIterator<Nexthop> for NexthopSet {
    fn from_iter<I: IntoIterator<Item = Nexthop>>(iter: I) -> Self {
        let mut set = NexthopSet::default();
        for nexthop in iter {
            set.insert(nexthop);
        }
        set
    }
}

// ===== impl NexthopKinds =====

impl<T> NexthopKinds<T> {
    pub fn get(&self, kind: NexthopKind) -> &T {
        match kind {
            NexthopKind::Ip => &self.ip,
            NexthopKind::Lsp => &self.lsp,
        }
    }

    pub fn get_mut(&mut self, kind: NexthopKind) -> &mut T {
        match kind {
            NexthopKind::Ip => &mut self.ip,
            NexthopKind::Lsp => &mut self.lsp,
        }
    }
}

impl NexthopKinds<NexthopSet> {
    pub fn is_empty(&self) -> bool {
        self.ip.is_empty() && self.lsp.is_empty()
    }

    pub fn clear(&mut self) {
        self.ip.clear();
        self.lsp.clear();
    }

    pub fn extend(&mut self, other: &NexthopKinds<NexthopSet>) {
        self.ip.extend(&other.ip);
        self.lsp.extend(&other.lsp);
    }

    // Returns a copy retaining only the nexthops selected by the predicate.
    fn filtered<F>(&self, f: F) -> NexthopKinds<NexthopSet>
    where
        F: Fn(&Nexthop) -> bool,
    {
        NexthopKinds {
            ip: self.ip.iter().copied().filter(|nh| f(nh)).collect(),
            lsp: self.lsp.iter().copied().filter(|nh| f(nh)).collect(),
        }
    }
}

// ===== impl SpfContext =====

impl SpfContext {
    pub fn new(config: SpfConfig) -> SpfContext {
        SpfContext {
            config,
            cand_tree: Default::default(),
            spf_log: Default::default(),
            spf_log_next_id: 0,
            spf_run_count: Default::default(),
        }
    }

    // Adds log entry for the SPF run.
    fn log_spf_run(&mut self, entry: SpfLogEntry) {
        self.spf_log.push_front(entry);

        // Remove old entries if necessary.
        self.spf_log.truncate(self.config.spf_log_max_size);
    }
}

impl Default for SpfContext {
    fn default() -> SpfContext {
        SpfContext::new(Default::default())
    }
}

// ===== global functions =====

// Runs SPF from the given root and returns the root's result list.
pub fn run_spf<'a>(
    ctx: &mut SpfContext,
    graph: &'a mut Graph,
    root: NodeIndex,
    level: LevelNumber,
    kind: SpfRunKind,
) -> Result<&'a SpfResultList, Error> {
    let node = graph
        .nodes
        .get(root)
        .ok_or(Error::NodeIndexNotFound(root))?;

    // Validate the request before touching any state.
    if !node.level_type.intersects(level) {
        return Err(Error::SpfRootLevelMismatch(node.name.clone(), level));
    }
    if node.is_overloaded(level) {
        return Err(Error::SpfRootOverloaded(node.name.clone(), level));
    }
    if kind != SpfRunKind::Forward && node.is_pseudonode(level) {
        return Err(Error::SpfRootPseudonode(node.name.clone(), level));
    }

    // A partial computation requires a previous full run.
    let mut kind = kind;
    if kind == SpfRunKind::PartialRouteCompute
        && node.spf.get(level).version == 0
    {
        kind = SpfRunKind::Full;
    }

    // The L2 computation depends on the L1 one having been done first.
    if kind == SpfRunKind::Full
        && level == LevelNumber::L2
        && node.level_type.intersects(LevelNumber::L1)
        && node.spf.l1.version == 0
        && !node.is_overloaded(LevelNumber::L1)
    {
        run_spf(ctx, graph, root, LevelNumber::L1, SpfRunKind::Full)?;
    }

    let start_time = Instant::now();
    Debug::SpfRunStart(&graph.nodes[root], level, kind).log();

    match kind {
        SpfRunKind::Full | SpfRunKind::Forward => {
            compute_spt(ctx, graph, root, level);
            if kind == SpfRunKind::Full {
                graph.nodes[root].spf.get_mut(level).version += 1;
                route::update_rib(graph, root, level);
            }
        }
        SpfRunKind::PartialRouteCompute => {
            route::update_rib(graph, root, level);
        }
    }

    let end_time = Instant::now();
    let reachable = graph.nodes[root].spf.get(level).results.len();
    Debug::SpfRunEnd(&graph.nodes[root], level, kind, reachable).log();

    // Update statistics.
    *ctx.spf_run_count.get_mut(level) += 1;

    // Add entry to SPF log.
    ctx.spf_log_next_id += 1;
    let entry = SpfLogEntry::new(
        ctx.spf_log_next_id,
        root,
        level,
        kind,
        start_time,
        end_time,
        reachable,
    );
    ctx.log_spf_run(entry);

    Ok(&graph.nodes[root].spf.get(level).results)
}

// ===== helper functions =====

// Computes the shortest-path tree rooted at the given node.
fn compute_spt(
    ctx: &mut SpfContext,
    graph: &mut Graph,
    root: NodeIndex,
    level: LevelNumber,
) {
    // The candidate tree is left empty by every run.
    assert!(ctx.cand_tree.is_empty(), "candidate tree isn't empty");
    ctx.cand_tree.reinitialize();

    // Forget what the previous run from this root found, then reset the
    // computation state of all nodes reachable from it.
    for node in graph.nodes.iter_mut() {
        node.spf.get_mut(level).self_results.remove(&root);
    }
    for node_idx in graph.reachable_nodes(root, level) {
        graph.nodes[node_idx].spf.get_mut(level).reset();
    }
    let root_spf = graph.nodes[root].spf.get_mut(level);
    root_spf.metric = 0;
    root_spf.results.clear();

    // Seed the direct nexthops.
    init_direct_nexthops(graph, root, level);

    // Initialize the candidate tree.
    graph.nodes[root].spf.get_mut(level).on_heap = true;
    ctx.cand_tree.push(root, cand_key(graph, level));

    // Main SPF loop.
    while let Some(vertex_idx) = ctx.cand_tree.pop_min(cand_key(graph, level))
    {
        let vertex = &mut graph.nodes[vertex_idx];
        let vertex_spf = vertex.spf.get_mut(level);
        assert!(vertex_spf.on_heap, "{} isn't on the heap", vertex.name);
        vertex_spf.on_heap = false;

        // Record the result. Pseudo-nodes are transit-only and don't show up
        // in the result list.
        let result = SpfResult::new(
            vertex_idx,
            vertex_spf.metric,
            vertex_spf.nexthops.clone(),
        );
        vertex_spf.self_results.insert(root, result.clone());
        if !vertex.is_pseudonode(level) {
            graph.nodes[root].spf.get_mut(level).results.push(result);
        }

        relax_neighbors(ctx, graph, root, vertex_idx, level);
    }
}

// Candidate tree key. Pseudo-nodes are popped before routers at the same
// distance so that zero-cost LAN edges are relaxed in time.
fn cand_key(
    graph: &Graph,
    level: LevelNumber,
) -> impl Fn(NodeIndex) -> (Metric, bool) + '_ {
    move |node_idx| {
        let node = &graph.nodes[node_idx];
        (node.spf.get(level).metric, !node.is_pseudonode(level))
    }
}

// Seeds the direct nexthops of the nodes that are one hop away from the root,
// either through a point-to-point link or through a LAN.
fn init_direct_nexthops(graph: &mut Graph, root: NodeIndex, level: LevelNumber) {
    let seeds = graph
        .logical_neighbors(root, level)
        .map(|nbr| {
            let edge = &graph.edges[nbr.edge];
            let gateway = match nbr.pn_edge {
                Some(pn_edge_idx) => graph.edges[pn_edge_idx].gateway(),
                None => edge.gateway(),
            };
            let nexthop = Nexthop::new(nbr.node, nbr.edge, gateway);
            (nbr.node, edge.nexthop_kind(), nexthop)
        })
        .collect::<Vec<_>>();

    for (node_idx, kind, nexthop) in seeds {
        let node_spf = graph.nodes[node_idx].spf.get_mut(level);
        node_spf.direct_nexthops.get_mut(kind).insert(nexthop);
    }
}

// Relaxes all edges leaving the given vertex.
fn relax_neighbors(
    ctx: &mut SpfContext,
    graph: &mut Graph,
    root: NodeIndex,
    vertex_idx: NodeIndex,
    level: LevelNumber,
) {
    let vertex = &graph.nodes[vertex_idx];

    // Overloaded nodes don't carry transit traffic.
    if vertex_idx != root && vertex.is_overloaded(level) {
        return;
    }

    let vertex_spf = vertex.spf.get(level);
    let vertex_metric = vertex_spf.metric;
    let vertex_nexthops = vertex_spf.nexthops.clone();
    let links = graph
        .physical_neighbors(vertex_idx, level)
        .filter(|(nbr_idx, edge_idx)| {
            // Only the root is never relaxed.
            *nbr_idx != root
                && (graph.edges[*edge_idx].edge_type == EdgeType::Lsp
                    || graph.is_two_way_nbr(vertex_idx, *nbr_idx, level))
        })
        .collect::<Vec<_>>();

    for (nbr_idx, edge_idx) in links {
        let distance =
            metric_add(vertex_metric, graph.edges[edge_idx].metric(level));
        if distance == INFINITE_METRIC {
            Debug::SpfMaxPathMetric(&graph.nodes[nbr_idx], level).log();
            continue;
        }

        let nbr = &graph.nodes[nbr_idx];
        let nbr_spf = nbr.spf.get(level);
        if distance > nbr_spf.metric {
            // Ignore higher cost path.
            continue;
        }

        // Nexthops are inherited from the vertex, except when the vertex is
        // the root or a pseudo-node attached to it. In that case, the direct
        // nexthops of the neighbor that go through this very path are used.
        let nexthops = if !vertex_nexthops.is_empty() {
            vertex_nexthops.clone()
        } else if nbr.is_pseudonode(level) {
            NexthopKinds::default()
        } else {
            nbr_spf.direct_nexthops.filtered(|nexthop| {
                nexthop.oif == edge_idx
                    || graph.edges[nexthop.oif].to.node == vertex_idx
            })
        };

        let nbr_spf = graph.nodes[nbr_idx].spf.get_mut(level);
        if distance == nbr_spf.metric {
            // Equal-cost path. Nodes already moved to the shortest-path tree
            // are left untouched.
            if nbr_spf.on_heap {
                nbr_spf.nexthops.extend(&nexthops);
            }
            continue;
        }

        // Better path.
        nbr_spf.metric = distance;
        nbr_spf.nexthops = nexthops;
        if nbr_spf.on_heap {
            ctx.cand_tree.decrease_key(nbr_idx, cand_key(graph, level));
        } else {
            nbr_spf.on_heap = true;
            ctx.cand_tree.push(nbr_idx, cand_key(graph, level));
        }
    }
}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use generational_arena::Index;

    use super::*;

    fn nexthop(id: usize) -> Nexthop {
        Nexthop::new(
            Index::from_raw_parts(id, 0),
            Index::from_raw_parts(id + 100, 0),
            None,
        )
    }

    #[test]
    fn test_nexthop_set_dedup() {
        let mut set = NexthopSet::default();
        assert!(set.insert(nexthop(1)));
        assert!(set.insert(nexthop(2)));
        assert!(!set.insert(nexthop(1)));
        assert_eq!(set.len(), 2);
        assert!(set.uses_oif(Index::from_raw_parts(101, 0)));
        assert!(!set.uses_oif(Index::from_raw_parts(103, 0)));
    }

    #[test]
    fn test_nexthop_set_max_width() {
        let set = (0..10).map(nexthop).collect::<NexthopSet>();
        assert_eq!(set.len(), MAX_NEXTHOPS);
        assert_eq!(
            set.iter().copied().collect::<Vec<_>>(),
            (0..MAX_NEXTHOPS).map(nexthop).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_nexthop_kinds_extend() {
        let mut kinds = NexthopKinds::<NexthopSet>::default();
        assert!(kinds.is_empty());
        kinds.get_mut(NexthopKind::Lsp).insert(nexthop(1));

        let mut other = NexthopKinds::<NexthopSet>::default();
        other.ip.insert(nexthop(2));
        other.lsp.insert(nexthop(1));
        kinds.extend(&other);
        assert_eq!(kinds.get(NexthopKind::Ip).len(), 1);
        assert_eq!(kinds.get(NexthopKind::Lsp).len(), 1);

        kinds.clear();
        assert!(kinds.is_empty());
    }
}

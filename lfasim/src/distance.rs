//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use crate::collections::NodeIndex;
use crate::error::Error;
use crate::graph::Graph;
use crate::level::LevelNumber;
use crate::num::{INFINITE_METRIC, Metric};
use crate::spf::{self, SpfContext, SpfRunKind};

// Returns the distance from `x` to `y` as found by the last SPF runs.
//
// The result list of `x` is used whenever `y` is a regular node, even when `x`
// is a pseudo-node. Distances to a pseudo-node are only known through the
// cached self-result that the pseudo-node holds for `x`. Asking for the
// distance between two pseudo-nodes is an error.
//
// An overloaded node never runs SPF, so it only reaches itself.
pub fn distance(
    graph: &Graph,
    x: NodeIndex,
    y: NodeIndex,
    level: LevelNumber,
) -> Result<Metric, Error> {
    let x_node = graph.nodes.get(x).ok_or(Error::NodeIndexNotFound(x))?;
    let y_node = graph.nodes.get(y).ok_or(Error::NodeIndexNotFound(y))?;

    if x == y {
        return Ok(0);
    }

    match (x_node.is_pseudonode(level), y_node.is_pseudonode(level)) {
        (true, true) => Err(Error::DistancePseudonodePair(
            x_node.name.clone(),
            y_node.name.clone(),
        )),
        _ if x_node.is_overloaded(level) => Ok(INFINITE_METRIC),
        (_, false) => Ok(x_node
            .spf_result(level, y)
            .map(|result| result.metric)
            .unwrap_or(INFINITE_METRIC)),
        (false, true) => Ok(y_node
            .spf
            .get(level)
            .self_results
            .get(&x)
            .map(|result| result.metric)
            .unwrap_or(INFINITE_METRIC)),
    }
}

// Runs a forward SPF from the given node so that its distances become
// available, unless the node is overloaded.
pub(crate) fn compute_distances(
    ctx: &mut SpfContext,
    graph: &mut Graph,
    node_idx: NodeIndex,
    level: LevelNumber,
) -> Result<(), Error> {
    let node = &graph.nodes[node_idx];
    if node.is_overloaded(level) && !node.is_pseudonode(level) {
        return Ok(());
    }
    spf::run_spf(ctx, graph, node_idx, level, SpfRunKind::Forward)?;
    Ok(())
}

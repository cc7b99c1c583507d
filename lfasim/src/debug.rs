//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span};

use crate::edge::Edge;
use crate::graph::Graph;
use crate::level::LevelNumber;
use crate::lfa::LfaType;
use crate::node::Node;
use crate::spf::SpfRunKind;

// Simulator debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // Topology
    TopologyBuild(&'a Graph),
    TopologyInvert(LevelNumber),
    // SPF
    SpfRunStart(&'a Node, LevelNumber, SpfRunKind),
    SpfRunEnd(&'a Node, LevelNumber, SpfRunKind, usize),
    SpfMaxPathMetric(&'a Node, LevelNumber),
    // Routing table
    RibUpdate(&'a Node, LevelNumber, usize),
    // Fast reroute
    LfaStart(&'a Edge, LevelNumber),
    LfaFound(&'a Node, &'a Node, LfaType),
    LfaNotFound(&'a Node),
    RlfaUnsupportedBroadcast(&'a Edge),
    RlfaPqSpace(&'a Edge, usize),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::TopologyBuild(graph) => {
                let nodes = graph.nodes.len();
                let edges = graph.edges.len();
                debug!(%nodes, %edges, "{}", self);
            }
            Debug::TopologyInvert(level) => {
                debug!(%level, "{}", self);
            }
            Debug::SpfRunStart(root, level, kind) => {
                debug_span!("spf", root = %root.name, %level).in_scope(|| {
                    debug!(?kind, "{}", self);
                })
            }
            Debug::SpfRunEnd(root, level, kind, reachable) => {
                debug_span!("spf", root = %root.name, %level).in_scope(|| {
                    debug!(?kind, %reachable, "{}", self);
                })
            }
            Debug::SpfMaxPathMetric(node, level) => {
                debug!(node = %node.name, %level, "{}", self);
            }
            Debug::RibUpdate(root, level, routes) => {
                debug_span!("rib", root = %root.name, %level).in_scope(|| {
                    debug!(%routes, "{}", self);
                })
            }
            Debug::LfaStart(edge, level) => {
                debug_span!("fast-reroute", ifname = %edge.from.ifname)
                    .in_scope(|| {
                        debug!(%level, protection = ?edge.protection, "{}", self);
                    })
            }
            Debug::LfaFound(dest, alternate, lfa_type) => {
                debug!(
                    destination = %dest.name,
                    alternate = %alternate.name,
                    ?lfa_type,
                    "{}", self
                );
            }
            Debug::LfaNotFound(dest) => {
                debug!(destination = %dest.name, "{}", self);
            }
            Debug::RlfaUnsupportedBroadcast(edge) => {
                debug!(ifname = %edge.from.ifname, "{}", self);
            }
            Debug::RlfaPqSpace(edge, size) => {
                debug!(ifname = %edge.from.ifname, %size, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::TopologyBuild(..) => {
                write!(f, "topology built")
            }
            Debug::TopologyInvert(..) => {
                write!(f, "inverting topology")
            }
            Debug::SpfRunStart(..) => {
                write!(f, "starting SPF run")
            }
            Debug::SpfRunEnd(..) => {
                write!(f, "SPF run finished")
            }
            Debug::SpfMaxPathMetric(..) => {
                write!(f, "maximum path metric exceeded")
            }
            Debug::RibUpdate(..) => {
                write!(f, "routing table updated")
            }
            Debug::LfaStart(..) => {
                write!(f, "computing alternates for protected interface")
            }
            Debug::LfaFound(..) => {
                write!(f, "alternate found")
            }
            Debug::LfaNotFound(..) => {
                write!(f, "no alternate found")
            }
            Debug::RlfaUnsupportedBroadcast(..) => {
                write!(f, "remote LFA isn't supported on broadcast links")
            }
            Debug::RlfaPqSpace(..) => {
                write!(f, "PQ-space computed")
            }
        }
    }
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Two-level link-state route computation and fast-reroute simulator.
//!
//! The crate models an IS-IS-like network as a graph of routers and LAN
//! pseudo-nodes, computes shortest-path trees with ECMP next hops, and derives
//! Loop-Free Alternates (RFC 5286) and Remote LFAs (RFC 7490) for protected
//! interfaces.

pub mod candidate;
pub mod collections;
pub mod config;
pub mod debug;
pub mod distance;
pub mod edge;
pub mod error;
pub mod graph;
pub mod level;
pub mod lfa;
pub mod node;
pub mod num;
pub mod rlfa;
pub mod route;
pub mod spf;
pub mod topology;

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bitflags::bitflags;
use ipnetwork::IpNetwork;

use crate::collections::NodeIndex;
use crate::debug::Debug;
use crate::graph::Graph;
use crate::level::LevelNumber;
use crate::num::Metric;
use crate::spf::{NexthopKinds, NexthopSet, SpfResult};

// Routing table of an SPF root.
#[derive(Clone, Debug, Default)]
pub struct Rib(BTreeMap<IpNetwork, Route>);

// Routing table entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Route {
    pub metric: Metric,
    pub level: LevelNumber,
    // Closest node advertising the prefix.
    pub advertiser: NodeIndex,
    pub nexthops: NexthopKinds<NexthopSet>,
    pub flags: RouteFlags,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct RouteFlags: u8 {
        const CONNECTED = 0x01;
        const DEFAULT = 0x02;
        const STALE = 0x04;
    }
}

// ===== impl Rib =====

impl Rib {
    pub fn get(&self, prefix: &IpNetwork) -> Option<&Route> {
        self.0.get(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IpNetwork, &Route)> + '_ {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // Returns the default routes.
    pub fn default_routes(&self) -> impl Iterator<Item = &Route> + '_ {
        self.0
            .values()
            .filter(|route| route.flags.contains(RouteFlags::DEFAULT))
    }

    fn mark_stale(&mut self) {
        for route in self.0.values_mut() {
            route.flags.insert(RouteFlags::STALE);
        }
    }

    // Adds a route to the table. An existing route is replaced if it's stale
    // or if the new route is better, and its nexthops are merged with the
    // new ones if both have the same cost.
    fn install(&mut self, prefix: IpNetwork, route: Route) {
        match self.0.get_mut(&prefix) {
            Some(current)
                if !current.flags.contains(RouteFlags::STALE)
                    && current.metric == route.metric =>
            {
                current.nexthops.extend(&route.nexthops);
            }
            Some(current)
                if !current.flags.contains(RouteFlags::STALE)
                    && current.metric < route.metric => {}
            _ => {
                self.0.insert(prefix, route);
            }
        }
    }

    fn remove_stale(&mut self) {
        self.0
            .retain(|_, route| !route.flags.contains(RouteFlags::STALE));
    }
}

// ===== impl Route =====

impl Route {
    fn new(
        result: &SpfResult,
        root: NodeIndex,
        level: LevelNumber,
        flags: RouteFlags,
    ) -> Route {
        let mut flags = flags;
        if result.node == root {
            flags.insert(RouteFlags::CONNECTED);
        }
        Route {
            metric: result.metric,
            level,
            advertiser: result.node,
            nexthops: result.nexthops.clone(),
            flags,
        }
    }
}

// ===== global functions =====

// Rebuilds the routing table of the root from its cached SPF results.
pub(crate) fn update_rib(
    graph: &mut Graph,
    root: NodeIndex,
    level: LevelNumber,
) {
    let mut rib = std::mem::take(graph.nodes[root].rib.get_mut(level));
    rib.mark_stale();

    // Install the prefixes advertised by every reachable node. Results are
    // ordered by increasing distance.
    let node = &graph.nodes[root];
    for result in node.spf_results(level) {
        let dest = &graph.nodes[result.node];
        for prefix in dest.prefixes.iter().copied() {
            let route = Route::new(result, root, level, RouteFlags::empty());
            rib.install(prefix, route);
        }
    }

    // Level 1 routers that aren't attached to the backbone themselves send
    // everything else toward the closest attached routers.
    if level == LevelNumber::L1 && !node.is_attached() {
        let attached = node
            .spf_results(level)
            .iter()
            .filter(|result| {
                result.node != root && graph.nodes[result.node].is_attached()
            })
            .collect::<Vec<_>>();
        let closest = attached.first().map(|result| result.metric);
        for result in attached
            .iter()
            .take_while(|result| Some(result.metric) == closest)
        {
            for prefix in default_prefixes() {
                let route =
                    Route::new(result, root, level, RouteFlags::DEFAULT);
                rib.install(prefix, route);
            }
        }
    }

    rib.remove_stale();
    Debug::RibUpdate(node, level, rib.len()).log();
    *graph.nodes[root].rib.get_mut(level) = rib;
}

// ===== helper functions =====

fn default_prefixes() -> impl Iterator<Item = IpNetwork> {
    [
        IpAddr::from(Ipv4Addr::UNSPECIFIED),
        IpAddr::from(Ipv6Addr::UNSPECIFIED),
    ]
    .into_iter()
    .filter_map(|addr| IpNetwork::new(addr, 0).ok())
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use common::*;
use lfasim::distance::distance;
use lfasim::edge::ProtectionType;
use lfasim::error::Error;
use lfasim::level::LevelNumber;
use lfasim::lfa::{LfaAlternate, LfaRecord, LfaType, compute_lfa};
use lfasim::num::metric_add;
use lfasim::spf::{Nexthop, SpfContext};

const BROADCAST_TOPOLOGY: &str = r#"
[[nodes]]
name = "rt1"
router-id = "1.1.1.1"

[[nodes]]
name = "rt2"
router-id = "2.2.2.2"

[[nodes]]
name = "rt3"
router-id = "3.3.3.3"

[[nodes]]
name = "rt4"
router-id = "4.4.4.4"

[[lans]]
name = "lan1"
members = [
  { node = "rt1", ifname = "eth0", protection = "link" },
  { node = "rt2", ifname = "eth0" },
  { node = "rt3", ifname = "eth0" },
]

[[links]]
a = { node = "rt1", ifname = "eth-rt4" }
b = { node = "rt4", ifname = "eth-rt1" }

[[links]]
a = { node = "rt4", ifname = "eth-rt3" }
b = { node = "rt3", ifname = "eth-rt4" }
"#;

// LAN whose members rt2 and rt3 both reach rt4, rt3 at a higher cost.
const BROADCAST_MEMBER_TOPOLOGY: &str = r#"
[[nodes]]
name = "rt1"
router-id = "1.1.1.1"

[[nodes]]
name = "rt2"
router-id = "2.2.2.2"

[[nodes]]
name = "rt3"
router-id = "3.3.3.3"

[[nodes]]
name = "rt4"
router-id = "4.4.4.4"

[[lans]]
name = "lan1"
members = [
  { node = "rt1", ifname = "eth0", protection = "link-and-node" },
  { node = "rt2", ifname = "eth0" },
  { node = "rt3", ifname = "eth0" },
]

[[links]]
a = { node = "rt2", ifname = "eth-rt4" }
b = { node = "rt4", ifname = "eth-rt2" }

[[links]]
a = { node = "rt3", ifname = "eth-rt4" }
b = { node = "rt4", ifname = "eth-rt3" }
metric = 15
"#;

// Same LAN, with rt1 also connected to rt4 through rt5.
const BROADCAST_NODE_TOPOLOGY: &str = r#"
[[nodes]]
name = "rt1"
router-id = "1.1.1.1"

[[nodes]]
name = "rt2"
router-id = "2.2.2.2"

[[nodes]]
name = "rt3"
router-id = "3.3.3.3"

[[nodes]]
name = "rt4"
router-id = "4.4.4.4"

[[nodes]]
name = "rt5"
router-id = "5.5.5.5"

[[lans]]
name = "lan1"
members = [
  { node = "rt1", ifname = "eth0", protection = "link-and-node" },
  { node = "rt2", ifname = "eth0" },
  { node = "rt3", ifname = "eth0" },
]

[[links]]
a = { node = "rt2", ifname = "eth-rt4" }
b = { node = "rt4", ifname = "eth-rt2" }

[[links]]
a = { node = "rt1", ifname = "eth-rt5" }
b = { node = "rt5", ifname = "eth-rt1" }

[[links]]
a = { node = "rt5", ifname = "eth-rt4" }
b = { node = "rt4", ifname = "eth-rt5" }
metric = 15
"#;

// rt5 reaches rt2 through the LAN, but not through rt1.
const BROADCAST_TRANSIT_TOPOLOGY: &str = r#"
[[nodes]]
name = "rt1"
router-id = "1.1.1.1"

[[nodes]]
name = "rt2"
router-id = "2.2.2.2"

[[nodes]]
name = "rt3"
router-id = "3.3.3.3"

[[nodes]]
name = "rt5"
router-id = "5.5.5.5"

[[lans]]
name = "lan1"
members = [
  { node = "rt1", ifname = "eth0", protection = "link" },
  { node = "rt2", ifname = "eth0" },
  { node = "rt3", ifname = "eth0" },
]

[[links]]
a = { node = "rt1", ifname = "eth-rt5" }
b = { node = "rt5", ifname = "eth-rt1" }

[[links]]
a = { node = "rt5", ifname = "eth-rt3" }
b = { node = "rt3", ifname = "eth-rt5" }
metric = 5
"#;

//
// Helper functions.
//

// Returns (alternate, destination, type, metric) tuples, by destination name.
fn alternates(
    graph: &lfasim::graph::Graph,
    record: &LfaRecord,
) -> Vec<(String, String, LfaType, u32)> {
    let mut alternates = record
        .alternates
        .iter()
        .map(|alt| {
            (
                name(graph, alt.node),
                name(graph, alt.destination),
                alt.lfa_type,
                alt.metric,
            )
        })
        .collect::<Vec<_>>();
    alternates.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    alternates
}

//
// Tests.
//

#[test]
fn test_lfa_ring6_link_protection() {
    let mut graph = ring(6, 10);
    let protected_edge =
        protect(&mut graph, "rt1", "eth-rt2", ProtectionType::Link);
    let rt1 = node(&graph, "rt1");

    // The only candidate is a downstream alternate for a destination that is
    // also reachable through an equal-cost path, so it's discarded.
    let mut ctx = SpfContext::default();
    let record = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        protected_edge,
        LevelNumber::L1,
        false,
    )
    .unwrap();
    assert!(record.is_none());
}

#[test]
fn test_lfa_ring6_node_protection() {
    let mut graph = ring(6, 10);
    let protected_edge =
        protect(&mut graph, "rt1", "eth-rt2", ProtectionType::LinkAndNode);
    let rt1 = node(&graph, "rt1");

    let mut ctx = SpfContext::default();
    let record = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        protected_edge,
        LevelNumber::L1,
        false,
    )
    .unwrap()
    .unwrap();
    assert_eq!(record.protected_edge, protected_edge);
    assert_eq!(record.level, LevelNumber::L1);
    assert_eq!(
        alternates(&graph, &record),
        vec![(
            "rt6".to_owned(),
            "rt4".to_owned(),
            LfaType::LinkAndNodeProtection,
            30
        )]
    );

    let alt = &record.alternates[0];
    assert_eq!(alt.nexthop.node, node(&graph, "rt6"));
    assert_eq!(alt.nexthop.oif, edge(&graph, "rt1", "eth-rt6"));
}

#[test]
fn test_lfa_ring5() {
    let mut graph = ring(5, 10);
    let protected_edge =
        protect(&mut graph, "rt1", "eth-rt2", ProtectionType::Link);
    let rt1 = node(&graph, "rt1");

    // rt2 itself can't be protected: rt5 would send the traffic back.
    let mut ctx = SpfContext::default();
    let record = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        protected_edge,
        LevelNumber::L1,
        false,
    )
    .unwrap()
    .unwrap();
    assert_eq!(
        alternates(&graph, &record),
        vec![(
            "rt5".to_owned(),
            "rt3".to_owned(),
            LfaType::LinkProtection,
            30
        )]
    );
    assert!(record.best_alternate(node(&graph, "rt2")).is_none());

    // The alternate isn't downstream of rt1.
    let record = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        protected_edge,
        LevelNumber::L1,
        true,
    )
    .unwrap();
    assert!(record.is_none());
}

#[test]
fn test_lfa_loop_free() {
    let mut graph = grid(3, 4);
    let level = LevelNumber::L1;
    let root = node(&graph, "rt-1-1");
    let edges = graph.nodes[root].edges.clone();

    let mut ctx = SpfContext::default();
    let mut found = 0;
    for protected_edge in edges {
        graph.set_protection(protected_edge, ProtectionType::LinkAndNode);
        let Some(record) = compute_lfa(
            &mut ctx,
            &mut graph,
            root,
            protected_edge,
            level,
            false,
        )
        .unwrap() else {
            continue;
        };

        for alt in &record.alternates {
            let nbr = alt.node;
            let dest = alt.destination;
            let dist_nbr_dest = distance(&graph, nbr, dest, level).unwrap();
            let dist_nbr_root = distance(&graph, nbr, root, level).unwrap();
            let dist_root_dest = distance(&graph, root, dest, level).unwrap();
            assert!(dist_nbr_dest < metric_add(dist_nbr_root, dist_root_dest));
            assert_ne!(alt.nexthop.oif, protected_edge);
            assert!(
                graph.nodes[root]
                    .spf_result(level, dest)
                    .unwrap()
                    .nexthops
                    .ip
                    .uses_oif(protected_edge)
            );
            found += 1;
        }
    }
    assert!(found > 0);
}

#[test]
fn test_lfa_two_nodes() {
    let mut graph = routers(&["rt1", "rt2"]);
    let (protected_edge, _) = connect(&mut graph, "rt1", "rt2", 10);
    graph.set_protection(protected_edge, ProtectionType::LinkAndNode);
    let rt1 = node(&graph, "rt1");

    let mut ctx = SpfContext::default();
    let record = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        protected_edge,
        LevelNumber::L1,
        false,
    )
    .unwrap();
    assert!(record.is_none());
}

#[test]
fn test_lfa_broadcast() {
    let mut graph = build(BROADCAST_TOPOLOGY);
    let protected_edge = edge(&graph, "rt1", "eth0");
    let rt1 = node(&graph, "rt1");

    let mut ctx = SpfContext::default();
    let record = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        protected_edge,
        LevelNumber::L1,
        false,
    )
    .unwrap()
    .unwrap();
    assert_eq!(
        alternates(&graph, &record),
        vec![(
            "rt4".to_owned(),
            "rt3".to_owned(),
            LfaType::BroadcastLinkProtection,
            20
        )]
    );
    assert!(record.best_alternate(node(&graph, "rt2")).is_none());
}

#[test]
fn test_lfa_broadcast_lan_member() {
    let mut graph = build(BROADCAST_MEMBER_TOPOLOGY);
    let protected_edge = edge(&graph, "rt1", "eth0");
    let rt1 = node(&graph, "rt1");

    // rt3 is reached through the LAN and avoids rt2, so it protects rt4
    // against the failure of rt2 but not against the failure of the LAN.
    let mut ctx = SpfContext::default();
    let record = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        protected_edge,
        LevelNumber::L1,
        false,
    )
    .unwrap()
    .unwrap();
    assert_eq!(
        alternates(&graph, &record),
        vec![(
            "rt3".to_owned(),
            "rt4".to_owned(),
            LfaType::BroadcastOnlyNodeProtection,
            25
        )]
    );

    let alt = &record.alternates[0];
    assert_eq!(alt.nexthop.node, node(&graph, "rt3"));
    assert_eq!(alt.nexthop.oif, protected_edge);
    assert!(record.best_alternate(node(&graph, "rt2")).is_none());
    assert!(record.best_alternate(node(&graph, "rt3")).is_none());
}

#[test]
fn test_lfa_broadcast_node_protection() {
    let mut graph = build(BROADCAST_NODE_TOPOLOGY);
    let protected_edge = edge(&graph, "rt1", "eth0");
    let rt1 = node(&graph, "rt1");

    let mut ctx = SpfContext::default();
    let record = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        protected_edge,
        LevelNumber::L1,
        false,
    )
    .unwrap()
    .unwrap();
    assert_eq!(
        alternates(&graph, &record),
        vec![(
            "rt5".to_owned(),
            "rt4".to_owned(),
            LfaType::BroadcastLinkAndNodeProtection,
            25
        )]
    );
    assert_eq!(
        record.alternates[0].nexthop.oif,
        edge(&graph, "rt1", "eth-rt5")
    );
}

#[test]
fn test_lfa_broadcast_transit() {
    let mut graph = build(BROADCAST_TRANSIT_TOPOLOGY);
    let protected_edge = edge(&graph, "rt1", "eth0");
    let rt1 = node(&graph, "rt1");
    let level = LevelNumber::L1;

    // rt5 is loop-free for rt2, but its path crosses the LAN.
    let mut ctx = SpfContext::default();
    let record =
        compute_lfa(&mut ctx, &mut graph, rt1, protected_edge, level, false)
            .unwrap()
            .unwrap();
    let rt2 = node(&graph, "rt2");
    let rt5 = node(&graph, "rt5");
    assert_eq!(distance(&graph, rt5, rt2, level).unwrap(), 15);
    assert!(record.best_alternate(rt2).is_none());
    assert_eq!(
        alternates(&graph, &record),
        vec![(
            "rt5".to_owned(),
            "rt3".to_owned(),
            LfaType::BroadcastLinkProtectionDownstream,
            15
        )]
    );
}

#[test]
fn test_lfa_unprotected_edge() {
    let mut graph = ring(5, 10);
    let protected_edge = edge(&graph, "rt1", "eth-rt2");
    let rt1 = node(&graph, "rt1");

    let mut ctx = SpfContext::default();
    let record = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        protected_edge,
        LevelNumber::L1,
        false,
    )
    .unwrap();
    assert!(record.is_none());
    assert!(ctx.spf_log.is_empty());
}

#[test]
fn test_lfa_invalid_edge() {
    let mut graph = ring(5, 10);
    let rt1 = node(&graph, "rt1");
    let mut ctx = SpfContext::default();

    // The edge must belong to the computing node.
    let remote_edge =
        protect(&mut graph, "rt2", "eth-rt3", ProtectionType::Link);
    let error = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        remote_edge,
        LevelNumber::L1,
        false,
    )
    .unwrap_err();
    assert!(matches!(error, Error::ProtectedEdgeNotLocal(..)));

    // The edge must be up.
    let down_edge = protect(&mut graph, "rt1", "eth-rt2", ProtectionType::Link);
    graph.set_link_status(down_edge, false);
    let error = compute_lfa(
        &mut ctx,
        &mut graph,
        rt1,
        down_edge,
        LevelNumber::L1,
        false,
    )
    .unwrap_err();
    assert!(matches!(error, Error::ProtectedEdgeInactive(..)));
}

#[test]
fn test_lfa_best_alternate() {
    let graph = ring(5, 10);
    let dest = node(&graph, "rt3");
    let protected_edge = edge(&graph, "rt1", "eth-rt2");
    let nexthop = Nexthop::new(
        node(&graph, "rt5"),
        edge(&graph, "rt1", "eth-rt5"),
        None,
    );

    let mut record = LfaRecord::new(protected_edge, LevelNumber::L1);
    assert!(record.best_alternate(dest).is_none());
    for (alt_name, lfa_type, metric) in [
        ("rt5", LfaType::LinkProtection, 20),
        ("rt4", LfaType::RemoteLinkProtectionDownstream, 40),
        ("rt5", LfaType::LinkProtectionDownstream, 30),
    ] {
        record.alternates.push(LfaAlternate::new(
            node(&graph, alt_name),
            dest,
            nexthop,
            lfa_type,
            metric,
        ));
    }

    // Downstream alternates are preferred, then the cheapest one.
    let best = record.best_alternate(dest).unwrap();
    assert_eq!(best.lfa_type, LfaType::LinkProtectionDownstream);
    assert_eq!(best.metric, 30);

    // Node protection comes first.
    record.alternates.push(LfaAlternate::new(
        node(&graph, "rt4"),
        dest,
        nexthop,
        LfaType::RemoteLinkAndNodeProtection,
        50,
    ));
    let best = record.best_alternate(dest).unwrap();
    assert_eq!(best.lfa_type, LfaType::RemoteLinkAndNodeProtection);
    assert_eq!(record.alternates_for(dest).count(), 4);
    assert_eq!(record.destinations().len(), 1);
}

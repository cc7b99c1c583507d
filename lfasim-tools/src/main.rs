//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod config;

use clap::{App, Arg, ArgMatches};
use config::{Config, LoggingFmtStyle};
use lfasim::error::Error;
use lfasim::graph::Graph;
use lfasim::level::LevelNumber;
use lfasim::lfa::LfaRecord;
use lfasim::rlfa;
use lfasim::spf::{self, NexthopSet, SpfContext, SpfResult, SpfRunKind};
use lfasim::topology::TopologyDesc;
use serde_json::{Value, json};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

fn init_tracing(config: &config::Logging, force: bool) {
    // Logs go to stderr so they never mix with the computation output.
    let stderr = (config.stderr.enabled || force).then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(config.stderr.show_thread_id)
            .with_file(config.stderr.show_source)
            .with_line_number(config.stderr.show_source)
            .with_ansi(config.stderr.colors);
        let layer = match config.stderr.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr)
        .init();
}

fn parse_level(matches: &ArgMatches<'_>) -> Result<LevelNumber, String> {
    let level = matches.value_of("level").unwrap_or("1");
    let level = level
        .parse::<u8>()
        .map_err(|_| format!("invalid level: {level}"))?;
    LevelNumber::try_from(level).map_err(|error| error.to_string())
}

fn nexthops_json(graph: &Graph, nexthops: &NexthopSet) -> Vec<Value> {
    nexthops
        .iter()
        .map(|nexthop| {
            json!({
                "node": graph.nodes[nexthop.node].name,
                "interface": graph.edges[nexthop.oif].from.ifname,
                "gateway": nexthop.gateway,
            })
        })
        .collect()
}

fn result_json(graph: &Graph, result: &SpfResult) -> Value {
    json!({
        "node": graph.nodes[result.node].name,
        "metric": result.metric,
        "nexthops": nexthops_json(graph, &result.nexthops.ip),
        "lsp-nexthops": nexthops_json(graph, &result.nexthops.lsp),
    })
}

fn backups_json(graph: &Graph, record: Option<&LfaRecord>) -> Value {
    let alternates = record
        .map(|record| {
            record
                .alternates
                .iter()
                .map(|alt| {
                    json!({
                        "destination": graph.nodes[alt.destination].name,
                        "alternate": graph.nodes[alt.node].name,
                        "type": alt.lfa_type,
                        "metric": alt.metric,
                        "nexthop": graph.nodes[alt.nexthop.node].name,
                        "interface": graph.edges[alt.nexthop.oif].from.ifname,
                    })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    Value::Array(alternates)
}

fn print_text(
    graph: &Graph,
    root: &str,
    level: LevelNumber,
    results: &[SpfResult],
    backups: Option<Option<&LfaRecord>>,
) {
    let node_idx = graph.nodes.get_by_name(root);

    println!("SPF results for {root} (level {level}):");
    for result in results {
        let nexthops = result
            .nexthops
            .ip
            .iter()
            .chain(result.nexthops.lsp.iter())
            .map(|nexthop| {
                format!(
                    "{}/{}",
                    graph.nodes[nexthop.node].name,
                    graph.edges[nexthop.oif].from.ifname
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {:<16} {:>10}  {}",
            graph.nodes[result.node].name, result.metric, nexthops
        );
    }

    if let Some(node_idx) = node_idx {
        println!("Routes:");
        for (prefix, route) in graph.nodes[node_idx].rib.get(level).iter() {
            println!(
                "  {:<24} {:>10}  via {} [{:?}]",
                prefix.to_string(),
                route.metric,
                graph.nodes[route.advertiser].name,
                route.flags
            );
        }
    }

    if let Some(record) = backups {
        println!("Backups:");
        let Some(record) = record else {
            println!("  none");
            return;
        };
        for alt in &record.alternates {
            println!(
                "  {:<16} via {:<16} {:>10}  {}",
                graph.nodes[alt.destination].name,
                graph.nodes[alt.node].name,
                alt.metric,
                alt.lfa_type
            );
        }
    }
}

fn run(matches: &ArgMatches<'_>, config: Config) -> Result<(), String> {
    let topology = matches.value_of("topology").unwrap_or_default();
    let root = matches.value_of("root").unwrap_or_default();
    let level = parse_level(matches)?;
    let map_err = |error: Error| {
        error.log();
        error.to_string()
    };

    let mut graph = TopologyDesc::load(topology)
        .and_then(|desc| desc.build())
        .map_err(map_err)?;
    let root_idx = graph.nodes.lookup(root).map_err(map_err)?;
    let mut ctx = SpfContext::new(config.spf);

    let results =
        spf::run_spf(&mut ctx, &mut graph, root_idx, level, SpfRunKind::Full)
            .map_err(map_err)?
            .clone();
    info!(%root, %level, reachable = results.len(), "SPF completed");

    // Alternates are computed last since they run SPF from other roots.
    let backups = match matches.value_of("protect") {
        Some(ifname) => {
            let edge_idx = graph
                .edge_by_ifname(root_idx, ifname)
                .ok_or_else(|| {
                    Error::EdgeNotFound(root.to_owned(), ifname.to_owned())
                })
                .map_err(map_err)?;
            let record = rlfa::compute_backups(
                &mut ctx, &mut graph, root_idx, edge_idx, level,
            )
            .map_err(map_err)?;
            Some(record)
        }
        None => None,
    };

    if matches.is_present("json") {
        let mut output = json!({
            "root": root,
            "level": level,
            "results": results
                .iter()
                .map(|result| result_json(&graph, result))
                .collect::<Vec<_>>(),
            "routes": graph.nodes[root_idx]
                .rib
                .get(level)
                .iter()
                .map(|(prefix, route)| {
                    json!({
                        "prefix": prefix,
                        "metric": route.metric,
                        "advertiser": graph.nodes[route.advertiser].name,
                        "nexthops": nexthops_json(&graph, &route.nexthops.ip),
                    })
                })
                .collect::<Vec<_>>(),
        });
        if let Some(record) = &backups {
            output["backups"] = backups_json(&graph, record.as_ref());
        }
        match serde_json::to_string_pretty(&output) {
            Ok(output) => println!("{output}"),
            Err(error) => return Err(error.to_string()),
        }
    } else {
        let backups = backups.as_ref().map(|record| record.as_ref());
        print_text(&graph, root, level, &results, backups);
    }

    Ok(())
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("Link-state routing simulator")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .arg(
            Arg::with_name("topology")
                .short("t")
                .long("topology")
                .value_name("file")
                .required(true)
                .help("Topology description (TOML or JSON)."),
        )
        .arg(
            Arg::with_name("root")
                .short("r")
                .long("root")
                .value_name("node")
                .required(true)
                .help("Router computing the shortest-path tree."),
        )
        .arg(
            Arg::with_name("level")
                .short("l")
                .long("level")
                .value_name("1|2")
                .help("Routing level (defaults to 1)."),
        )
        .arg(
            Arg::with_name("protect")
                .short("p")
                .long("protect")
                .value_name("ifname")
                .help("Compute the alternates protecting this interface."),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Print the output in JSON format."),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log the computation steps to stderr."),
        )
        .get_matches();

    // Read configuration file.
    let config_file = matches.value_of("config");
    let config = Config::load(config_file);

    // Initialize tracing.
    init_tracing(&config.logging, matches.is_present("verbose"));

    if let Err(error) = run(&matches, config) {
        error!(%error, "computation failed");
        eprintln!("lfasim: {error}");
        std::process::exit(1);
    }
}

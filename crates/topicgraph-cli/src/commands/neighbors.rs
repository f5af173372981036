//! Neighbors command - Out-, in- or both-direction neighbor queries

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use topicgraph_core::TopicGraph;

use super::{open_graph, print_json, print_names};
use crate::GlobalOptions;

/// Which edges to follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// Topics this topic links to
    Out,
    /// Topics linking to this topic (scans every partition)
    In,
    Both,
}

/// Arguments for the neighbors command
#[derive(Args, Debug)]
pub struct NeighborsArgs {
    /// Topic name (case-insensitive)
    name: String,

    /// Direction to follow
    #[arg(long, short = 'd', value_enum, default_value_t = Direction::Out)]
    direction: Direction,

    /// Print only the counts
    #[arg(long)]
    count: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct NeighborsView {
    topic: String,
    #[serde(rename = "out", skip_serializing_if = "Option::is_none")]
    out_neighbors: Option<BTreeSet<String>>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    in_neighbors: Option<BTreeSet<String>>,
}

/// Execute the neighbors command
pub fn execute(args: NeighborsArgs, global: &GlobalOptions) -> Result<()> {
    let (session, graph) = open_graph(global)?;
    let topic = graph.find_vertex(&args.name)?;
    // `--timeout-secs` arrives through the config overrides
    let timeout = session.config.query.timeout_secs.map(Duration::from_secs);

    let out_neighbors = match args.direction {
        Direction::Out | Direction::Both => Some(graph.find_out_neighbors(&topic.name)?),
        Direction::In => None,
    };
    let in_neighbors = match args.direction {
        Direction::In | Direction::Both => Some(in_neighbors(&graph, &topic.name, timeout)?),
        Direction::Out => None,
    };

    let view = NeighborsView {
        topic: topic.name,
        out_neighbors,
        in_neighbors,
    };

    if args.json {
        return print_json(&view);
    }

    let both = args.direction == Direction::Both;
    for (label, names) in [("Out", &view.out_neighbors), ("In", &view.in_neighbors)] {
        let Some(names) = names else {
            continue;
        };
        if args.count {
            println!("{}: {}", label.to_lowercase(), names.len());
        } else if both {
            print_names(Some(label), names);
        } else {
            print_names(None, names);
        }
    }
    Ok(())
}

fn in_neighbors(
    graph: &TopicGraph,
    name: &str,
    timeout: Option<Duration>,
) -> Result<BTreeSet<String>> {
    let names = match timeout {
        Some(timeout) => graph.find_in_neighbors_within(name, timeout)?,
        None => graph.find_in_neighbors(name)?,
    };
    Ok(names)
}

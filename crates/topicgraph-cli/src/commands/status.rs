//! Status command - Store location and counts per partition

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use topicgraph_config::CatchAllPolicy;
use topicgraph_core::GraphStats;

use super::{open_graph, print_json};
use crate::GlobalOptions;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// List empty partitions too
    #[arg(long)]
    all: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct StatusView {
    database: String,
    catch_all: CatchAllPolicy,
    fan_out_workers: usize,
    #[serde(flatten)]
    stats: GraphStats,
}

/// Execute the status command
pub fn execute(args: StatusArgs, global: &GlobalOptions) -> Result<()> {
    let (session, graph) = open_graph(global)?;
    let view = StatusView {
        database: session.db_path.display().to_string(),
        catch_all: session.config.partitioning.catch_all,
        fan_out_workers: graph.fan_out_workers(),
        stats: graph.stats()?,
    };

    if args.json {
        return print_json(&view);
    }

    let stats = &view.stats;
    println!("TopicGraph Status");
    println!("=================\n");
    println!("Database:  {}", view.database);
    println!("Catch-all: {}", view.catch_all);
    println!("Workers:   {}", view.fan_out_workers);
    println!();
    println!("Topics:    {}", stats.vertices);
    println!(
        "  degrees computed: {}, pending: {}",
        stats.processed_vertices, stats.unprocessed_vertices
    );
    println!("Links:     {}", stats.edges);
    println!("Roots:     {}", stats.root_topics);
    println!("  subtopic links: {}", stats.root_subtopics);
    println!();
    println!("Links per partition:");
    for (partition, count) in &stats.edges_by_partition {
        if *count > 0 || args.all {
            println!("  {:<12} {}", partition.table_name(), count);
        }
    }
    Ok(())
}

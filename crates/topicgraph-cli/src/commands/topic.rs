//! Topic command - Show a single topic

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use topicgraph_core::{PartitionId, Vertex};

use super::{open_graph, print_json};
use crate::GlobalOptions;

/// Arguments for the topic command
#[derive(Args, Debug)]
pub struct TopicArgs {
    /// Topic name (case-insensitive)
    name: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct TopicView {
    #[serde(flatten)]
    vertex: Vertex,
    partition: PartitionId,
    out_edges: u64,
    subtopics: u64,
}

/// Execute the topic command
pub fn execute(args: TopicArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;

    let vertex = graph.find_vertex(&args.name)?;
    let view = TopicView {
        partition: vertex.partition(&graph.manager().scheme()),
        out_edges: graph.count_out_edges(&vertex.name)?,
        subtopics: graph.count_topic_subtopics(&vertex.name)?,
        vertex,
    };

    if args.json {
        return print_json(&view);
    }

    println!("{}", view.vertex.name);
    println!("  Id:        {}", view.vertex.id);
    println!("  Partition: {}", view.partition.table_name());
    println!("  Out links: {}", view.out_edges);
    println!("  Subtopics: {}", view.subtopics);
    match (view.vertex.indegree, view.vertex.outdegree) {
        (Some(indegree), Some(outdegree)) => {
            println!("  Indegree:  {}", indegree);
            println!("  Outdegree: {}", outdegree);
            println!("  Weight:    {}", view.vertex.weight);
        }
        _ => println!("  Degrees:   not computed (run 'topicgraph degrees update')"),
    }
    Ok(())
}

//! Subtopics command - Neighbors whose names contain the topic name

use anyhow::Result;
use clap::Args;

use super::{open_graph, print_json, print_names};
use crate::GlobalOptions;

/// Arguments for the subtopics command
#[derive(Args, Debug)]
pub struct SubtopicsArgs {
    /// Topic name (case-insensitive)
    name: String,

    /// List out-neighbors that are root topics instead
    #[arg(long)]
    roots: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the subtopics command
pub fn execute(args: SubtopicsArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;

    let names = if args.roots {
        graph.find_related_root_topics(&args.name)?
    } else {
        graph.find_potential_subtopics(&args.name)?
    };

    if args.json {
        return print_json(&names);
    }
    print_names(None, &names);
    Ok(())
}

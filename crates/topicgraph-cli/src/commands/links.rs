//! Add-links command - Insert edges from one source topic

use anyhow::Result;
use clap::Args;
use topicgraph_core::DEFAULT_EDGE_TYPE;

use super::{open_graph, print_info, print_json};
use crate::GlobalOptions;

/// Arguments for the add-links command
#[derive(Args, Debug)]
pub struct AddLinksArgs {
    /// Source topic
    source: String,

    /// Target topics
    #[arg(required = true)]
    targets: Vec<String>,

    /// Edge type
    #[arg(long = "type", default_value = DEFAULT_EDGE_TYPE)]
    edge_type: String,

    /// Create missing source and target topics first
    #[arg(long)]
    create_missing: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the add-links command
pub fn execute(args: AddLinksArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;

    if args.create_missing {
        let created = graph.add_vertices(std::iter::once(&args.source).chain(&args.targets))?;
        if created.inserted > 0 {
            print_info(
                &format!("Created {} missing topics", created.inserted),
                global.quiet,
            );
        }
    }

    let report = graph.add_edges(&args.source, &args.targets, &args.edge_type)?;

    if args.json {
        return print_json(&report);
    }

    println!(
        "Added {} links from {} ({} existing, {} unknown targets)",
        report.inserted, args.source, report.existing, report.rejected
    );
    Ok(())
}

//! Related command - Topics linked in both directions

use anyhow::Result;
use clap::Args;

use super::{open_graph, print_info, print_json, print_names};
use crate::GlobalOptions;

/// Arguments for the related command
#[derive(Args, Debug)]
pub struct RelatedArgs {
    /// Topic name (case-insensitive)
    name: String,

    /// Check a single pair instead of listing
    #[arg(long)]
    with: Option<String>,

    /// Retype the edges of every strongly related pair
    #[arg(long, conflicts_with = "with")]
    mark: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the related command
pub fn execute(args: RelatedArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;

    if let Some(ref other) = args.with {
        let related = graph.strongly_related(&args.name, other)?;
        if args.json {
            return print_json(&related);
        }
        println!("{}", if related { "yes" } else { "no" });
        return Ok(());
    }

    let related = graph.find_strongly_related(&args.name)?;

    if args.mark {
        let marked = graph.mark_strong_relations(&args.name)?;
        print_info(
            &format!("Marked {} strongly related pairs", marked),
            global.quiet,
        );
    }

    if args.json {
        return print_json(&related);
    }
    print_names(None, &related);
    Ok(())
}

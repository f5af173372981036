//! Cleanup command - Delete weakly connected malformed topics

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{open_graph, print_json};
use crate::progress::{finish_spinner, finish_spinner_warn, spinner};
use crate::GlobalOptions;

/// Arguments for the cleanup command
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Delete malformed topics with fewer neighbors than this in both
    /// directions (defaults to maintenance.cleanup_threshold)
    #[arg(long)]
    threshold: Option<u64>,

    /// Report what would be deleted without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct PlannedCleanup {
    name: String,
    indegree: usize,
    outdegree: usize,
    delete: bool,
}

/// Execute the cleanup command
pub fn execute(args: CleanupArgs, global: &GlobalOptions) -> Result<()> {
    let (session, graph) = open_graph(global)?;
    let threshold = args
        .threshold
        .unwrap_or(session.config.maintenance.cleanup_threshold);

    if args.dry_run {
        let mut plan = Vec::new();
        for vertex in graph.find_malformed_vertices()? {
            let candidate = graph.cleanup_candidate(&vertex.name)?;
            plan.push(PlannedCleanup {
                delete: candidate.is_deletable(threshold),
                indegree: candidate.in_neighbors.len(),
                outdegree: candidate.out_neighbors.len(),
                name: vertex.name,
            });
        }

        if args.json {
            return print_json(&plan);
        }
        for item in &plan {
            println!(
                "{} {} (in {}, out {})",
                if item.delete { "delete" } else { "keep  " },
                item.name,
                item.indegree,
                item.outdegree
            );
        }
        return Ok(());
    }

    let pb = spinner("Cleaning up malformed topics...", global.quiet || args.json);
    let report = graph.delete_malformed_vertices(threshold)?;
    let summary = format!(
        "Deleted {} malformed topics ({} kept, {} failed)",
        report.processed, report.skipped, report.failed
    );
    if report.failed > 0 {
        finish_spinner_warn(pb, &summary);
    } else {
        finish_spinner(pb, &summary);
    }

    if args.json {
        return print_json(&report);
    }
    println!("{}", summary);
    Ok(())
}

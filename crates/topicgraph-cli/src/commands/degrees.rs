//! Degrees command - Degree and weight maintenance

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use super::{open_graph, print_json};
use crate::progress::{finish_spinner, finish_spinner_error, finish_spinner_warn, spinner};
use crate::GlobalOptions;

/// Degree maintenance commands
#[derive(Subcommand, Debug)]
pub enum DegreesCommand {
    /// Compute degrees for every unprocessed topic
    Update(UpdateArgs),

    /// Show how many topics have degrees
    Status(JsonArgs),

    /// Clear stored degrees so the next update recomputes everything
    Reset,

    /// Compute the degrees of one topic without storing them
    Show(ShowArgs),
}

/// Arguments for degrees update
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Clear stored degrees first
    #[arg(long)]
    full: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
pub struct JsonArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Topic name (case-insensitive)
    name: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct DegreeStatus {
    processed: u64,
    unprocessed: u64,
}

/// Execute a degrees command
pub fn execute(cmd: DegreesCommand, global: &GlobalOptions) -> Result<()> {
    match cmd {
        DegreesCommand::Update(args) => execute_update(args, global),
        DegreesCommand::Status(args) => execute_status(args, global),
        DegreesCommand::Reset => execute_reset(global),
        DegreesCommand::Show(args) => execute_show(args, global),
    }
}

fn execute_update(args: UpdateArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;

    if args.full {
        graph.reset_degrees()?;
    }

    let pb = spinner("Updating degrees...", global.quiet || args.json);
    let report = match graph.update_degrees() {
        Ok(report) => report,
        Err(e) => {
            finish_spinner_error(pb, "Degree update failed");
            return Err(e.into());
        }
    };

    let summary = format!(
        "Updated degrees of {} topics ({} failed)",
        report.processed, report.failed
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

fn execute_status(args: JsonArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;
    let status = DegreeStatus {
        processed: graph.count_processed()?,
        unprocessed: graph.count_unprocessed()?,
    };

    if args.json {
        return print_json(&status);
    }
    println!("Processed:   {}", status.processed);
    println!("Unprocessed: {}", status.unprocessed);
    Ok(())
}

fn execute_reset(global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;
    let reset = graph.reset_degrees()?;
    println!("Reset degrees of {} topics", reset);
    Ok(())
}

fn execute_show(args: ShowArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;
    let degrees = graph.compute_degrees(&args.name)?;

    if args.json {
        return print_json(&degrees);
    }
    println!("Indegree:  {}", degrees.indegree);
    println!("Outdegree: {}", degrees.outdegree);
    println!("Subtopics: {}", degrees.subtopics);
    println!("Weight:    {}", degrees.weight);
    Ok(())
}

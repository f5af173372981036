//! Roots command - Root topic index

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use topicgraph_core::{MaintenanceReport, RootTopic};

use super::{open_graph, print_json};
use crate::progress::{finish_spinner, finish_spinner_error, spinner};
use crate::GlobalOptions;

/// Root topic commands
#[derive(Subcommand, Debug)]
pub enum RootsCommand {
    /// Rebuild the root topic index from the vertices
    Generate(GenerateArgs),

    /// Link root topics to their subtopics
    Subtopics(JsonArgs),

    /// Show one root topic and its subtopics
    Find(FindArgs),

    /// List root topics, heaviest first
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Skip linking subtopics after generating
    #[arg(long)]
    no_subtopics: bool,

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
pub struct FindArgs {
    /// Root topic name (case-insensitive)
    name: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show at most this many root topics
    #[arg(long, short = 'n', default_value = "20")]
    limit: usize,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct GenerateView {
    roots: MaintenanceReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtopics: Option<MaintenanceReport>,
}

#[derive(Debug, Serialize)]
struct RootView {
    #[serde(flatten)]
    root: RootTopic,
    subtopics: Vec<String>,
}

/// Execute a roots command
pub fn execute(cmd: RootsCommand, global: &GlobalOptions) -> Result<()> {
    match cmd {
        RootsCommand::Generate(args) => execute_generate(args, global),
        RootsCommand::Subtopics(args) => execute_subtopics(args, global),
        RootsCommand::Find(args) => execute_find(args, global),
        RootsCommand::List(args) => execute_list(args, global),
    }
}

fn execute_generate(args: GenerateArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;
    let quiet = global.quiet || args.json;

    let pb = spinner("Generating root topics...", quiet);
    let roots = match graph.generate_root_vertices() {
        Ok(report) => report,
        Err(e) => {
            finish_spinner_error(pb, "Root generation failed");
            return Err(e.into());
        }
    };
    finish_spinner(pb, &format!("Indexed {} root topics", roots.processed));

    let subtopics = if args.no_subtopics {
        None
    } else {
        let pb = spinner("Linking subtopics...", quiet);
        let report = graph.insert_root_subtopics()?;
        finish_spinner(pb, &format!("Linked {} root topics", report.processed));
        Some(report)
    };

    if args.json {
        return print_json(&GenerateView { roots, subtopics });
    }
    println!("Root topics: {}", graph.count_root_topics()?);
    Ok(())
}

fn execute_subtopics(args: JsonArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;

    let pb = spinner("Linking subtopics...", global.quiet || args.json);
    let report = graph.insert_root_subtopics()?;
    finish_spinner(pb, "Subtopics linked");

    if args.json {
        return print_json(&report);
    }
    println!(
        "Linked {} root topics ({} already linked, {} failed)",
        report.processed, report.skipped, report.failed
    );
    Ok(())
}

fn execute_find(args: FindArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;

    let root = graph.find_root_topic(&args.name)?;
    let subtopics = graph
        .find_root_subtopics(&root.name)?
        .into_iter()
        .map(|v| v.name)
        .collect();
    let view = RootView { root, subtopics };

    if args.json {
        return print_json(&view);
    }
    println!("{}", view.root.name);
    println!("  Weight:    {}", view.root.weight);
    println!("  Indegree:  {}", view.root.indegree);
    println!("  Outdegree: {}", view.root.outdegree);
    println!("  Subtopics ({}):", view.subtopics.len());
    for name in &view.subtopics {
        println!("    {}", name);
    }
    Ok(())
}

fn execute_list(args: ListArgs, global: &GlobalOptions) -> Result<()> {
    let (_, graph) = open_graph(global)?;
    let mut roots = graph.list_root_topics()?;
    roots.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.id.cmp(&b.id)));
    roots.truncate(args.limit);

    if args.json {
        return print_json(&roots);
    }
    for root in &roots {
        println!("{:>8}  {}", root.weight, root.name);
    }
    Ok(())
}

//! Init command - Create the graph store

use anyhow::{Context, Result};
use clap::Args;
use topicgraph_config::ConfigLoader;
use topicgraph_core::PARTITION_COUNT;
use tracing::info;

use super::{print_info, Session};
use crate::progress::{finish_spinner, spinner};
use crate::GlobalOptions;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Also write a default .topicgraph/config.toml into the workspace
    #[arg(long)]
    with_config: bool,
}

/// Execute the init command
pub fn execute(args: InitArgs, global: &GlobalOptions) -> Result<()> {
    let session = Session::load(global)?;

    if args.with_config {
        let loader = ConfigLoader::new();
        let path = loader
            .init_local(&session.workspace)
            .context("Failed to write local config")?;
        print_info(&format!("Config: {}", path.display()), global.quiet);
    }

    let existed = session.db_path.exists();
    let pb = spinner("Creating graph store...", global.quiet);
    let graph = session.create_graph()?;
    let vertices = graph.count_vertices()?;

    if existed {
        info!("Graph store already present, schema verified");
        finish_spinner(
            pb,
            &format!("Graph store already initialized ({} topics)", vertices),
        );
    } else {
        finish_spinner(pb, "Graph store created");
    }

    println!("Initialized topic graph at {}", session.db_path.display());
    print_info(
        &format!(
            "Partitions: {} (catch-all: {})",
            PARTITION_COUNT, session.config.partitioning.catch_all
        ),
        global.quiet,
    );
    Ok(())
}

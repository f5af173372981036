//! CLI command implementations
//!
//! Every command resolves the workspace, loads the layered configuration and
//! opens the graph store through the helpers below.

pub mod cleanup;
pub mod config;
pub mod degrees;
pub mod init;
pub mod links;
pub mod neighbors;
pub mod related;
pub mod roots;
pub mod status;
pub mod subtopics;
pub mod topic;
pub mod topics;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use topicgraph_config::{CatchAllPolicy, ConfigLoader, GraphConfig};
use topicgraph_core::{CatchAll, GraphOptions, TopicGraph, WeightPolicy};
use tracing::debug;

use crate::GlobalOptions;

/// Resolve the workspace path from options or current directory.
pub fn resolve_workspace(global: &GlobalOptions) -> Result<PathBuf> {
    if let Some(ref ws) = global.workspace {
        if ws.is_dir() {
            return ws
                .canonicalize()
                .with_context(|| format!("Failed to resolve workspace {}", ws.display()));
        }
        anyhow::bail!("Workspace '{}' is not a directory", ws.display());
    }

    std::env::current_dir().context("Failed to get current directory")
}

/// Load configuration with CLI overrides applied.
///
/// An explicit `--config` file replaces the global and local lookup.
pub fn load_config(global: &GlobalOptions, workspace: &Path) -> Result<GraphConfig> {
    let mut loader = ConfigLoader::new();
    let overrides = global.to_config_overrides();

    if let Some(ref config_path) = global.config {
        return loader
            .load_file(config_path, Some(&overrides))
            .with_context(|| format!("Failed to load config file {}", config_path.display()));
    }

    loader
        .load(workspace, Some(&overrides))
        .context("Failed to load configuration")
}

/// Translate the configuration into graph options.
pub fn graph_options(config: &GraphConfig) -> GraphOptions {
    GraphOptions {
        catch_all: catch_all(config.partitioning.catch_all),
        fan_out_workers: config.query.fan_out_workers,
        weight_policy: WeightPolicy {
            include_subtopics: config.maintenance.include_subtopics_in_weight,
        },
        cleanup_threshold: config.maintenance.cleanup_threshold,
        progress_interval: config.maintenance.progress_interval,
    }
}

fn catch_all(policy: CatchAllPolicy) -> CatchAll {
    match policy {
        CatchAllPolicy::Dedicated => CatchAll::Dedicated,
        CatchAllPolicy::Z => CatchAll::Z,
        CatchAllPolicy::Zero => CatchAll::Zero,
    }
}

/// A loaded configuration and the store it points at
pub struct Session {
    pub workspace: PathBuf,
    pub config: GraphConfig,
    pub db_path: PathBuf,
}

impl Session {
    pub fn load(global: &GlobalOptions) -> Result<Self> {
        let workspace = resolve_workspace(global)?;
        let config = load_config(global, &workspace)?;
        let db_path = config.database_path(&workspace);
        debug!("Using graph store {}", db_path.display());
        Ok(Self {
            workspace,
            config,
            db_path,
        })
    }

    /// Open (creating if needed) the store with the configured options.
    pub fn create_graph(&self) -> Result<TopicGraph> {
        TopicGraph::open(&self.db_path, graph_options(&self.config))
            .with_context(|| format!("Failed to open graph store {}", self.db_path.display()))
    }

    /// Open an existing store.
    pub fn open_graph(&self) -> Result<TopicGraph> {
        if !self.db_path.exists() {
            anyhow::bail!(
                "No graph store at {}. Run 'topicgraph init' first.",
                self.db_path.display()
            );
        }
        self.create_graph()
    }
}

/// Open the store for a command.
pub fn open_graph(global: &GlobalOptions) -> Result<(Session, TopicGraph)> {
    let session = Session::load(global)?;
    let graph = session.open_graph()?;
    Ok((session, graph))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}

/// Print a name list, one per line, with an optional heading.
pub fn print_names<'a>(heading: Option<&str>, names: impl IntoIterator<Item = &'a String>) {
    let names: Vec<&String> = names.into_iter().collect();
    if let Some(heading) = heading {
        println!("{} ({}):", heading, names.len());
    }
    for name in names {
        if heading.is_some() {
            println!("  {}", name);
        } else {
            println!("{}", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_options_from_config() {
        let mut config = GraphConfig::default();
        config.partitioning.catch_all = CatchAllPolicy::Zero;
        config.query.fan_out_workers = 4;
        config.maintenance.include_subtopics_in_weight = false;
        config.maintenance.cleanup_threshold = 3;

        let options = graph_options(&config);
        assert_eq!(options.catch_all, CatchAll::Zero);
        assert_eq!(options.fan_out_workers, 4);
        assert!(!options.weight_policy.include_subtopics);
        assert_eq!(options.cleanup_threshold, 3);
        assert_eq!(options.progress_interval, 1000);
    }

    #[test]
    fn test_default_options_match_core_defaults() {
        assert_eq!(
            graph_options(&GraphConfig::default()),
            GraphOptions::default()
        );
    }
}

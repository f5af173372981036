//! Config command - View and initialize configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use topicgraph_config::ConfigLoader;

use super::{load_config, print_json, resolve_workspace};
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Write a default config file
    Init(InitArgs),

    /// Show configuration file paths
    Path(PathArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON instead of TOML
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Write ~/.topicgraph/config.toml instead of the workspace config
    #[arg(long)]
    global: bool,
}

#[derive(Args, Debug)]
pub struct PathArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
struct ConfigPaths {
    global: Option<PathBuf>,
    local: PathBuf,
    global_exists: bool,
    local_exists: bool,
    database: PathBuf,
}

/// Execute a config command
pub fn execute(cmd: ConfigCommand, global: &GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, global),
        ConfigCommand::Init(args) => execute_init(args, global),
        ConfigCommand::Path(args) => execute_path(args, global),
    }
}

fn execute_show(args: ShowArgs, global: &GlobalOptions) -> Result<()> {
    let workspace = resolve_workspace(global)?;
    let config = load_config(global, &workspace)?;

    if args.json {
        return print_json(&config);
    }
    print!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to render configuration")?
    );
    Ok(())
}

fn execute_init(args: InitArgs, global: &GlobalOptions) -> Result<()> {
    let loader = ConfigLoader::new();
    let path = if args.global {
        loader.init_global()?
    } else {
        loader.init_local(&resolve_workspace(global)?)?
    };
    println!("{}", path.display());
    Ok(())
}

fn execute_path(args: PathArgs, global: &GlobalOptions) -> Result<()> {
    let workspace = resolve_workspace(global)?;
    let loader = ConfigLoader::new();
    let config = load_config(global, &workspace)?;

    let global_path = loader.global_config_path();
    let local_path = loader.local_config_path(&workspace);
    let paths = ConfigPaths {
        global_exists: global_path.as_ref().is_some_and(|p| p.exists()),
        local_exists: local_path.exists(),
        global: global_path,
        local: local_path,
        database: config.database_path(&workspace),
    };

    if args.json {
        return print_json(&paths);
    }

    match paths.global {
        Some(ref path) => println!(
            "Global:   {}{}",
            path.display(),
            if paths.global_exists { "" } else { " (missing)" }
        ),
        None => println!("Global:   (no home directory)"),
    }
    println!(
        "Local:    {}{}",
        paths.local.display(),
        if paths.local_exists { "" } else { " (missing)" }
    );
    println!("Database: {}", paths.database.display());
    Ok(())
}

//! TopicGraph CLI - Build, maintain and query topic graphs
//!
//! A command-line interface over a sharded SQLite topic graph: load topics
//! and links, run the maintenance jobs and answer neighbor queries.
//!
//! # Usage
//!
//! ```bash
//! # Create the store in the current workspace
//! topicgraph init
//!
//! # Load topics and links
//! topicgraph add-topics Elephant Africa Zoo
//! topicgraph add-links Elephant Africa Zoo
//!
//! # Query the graph
//! topicgraph neighbors Elephant --direction both
//!
//! # Run the maintenance jobs
//! topicgraph roots generate
//! topicgraph degrees update
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use topicgraph_config::{CatchAllPolicy, ConfigOverrides, LogFormat, LoggingConfig};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;
mod progress;

/// TopicGraph - Sharded hyperlink graph of topics
#[derive(Parser, Debug)]
#[command(name = "topicgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Workspace directory holding the .topicgraph data dir
    #[arg(long, short = 'w', global = true, env = "TOPICGRAPH_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, short = 'c', global = true, env = "TOPICGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Database file (overrides the workspace location)
    #[arg(long, global = true, env = "TOPICGRAPH_DB")]
    db: Option<PathBuf>,

    /// Worker groups for in-neighbor queries (1-37)
    #[arg(long, global = true, env = "TOPICGRAPH_WORKERS")]
    workers: Option<usize>,

    /// Catch-all partition policy (dedicated, z, zero)
    #[arg(long, global = true, env = "TOPICGRAPH_CATCH_ALL")]
    catch_all: Option<CatchAllPolicy>,

    /// Give up on in-neighbor queries after this many seconds
    #[arg(
        long,
        global = true,
        env = "TOPICGRAPH_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "TOPICGRAPH_LOG_LEVEL")]
    log_level: Option<String>,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            database_file: self
                .db
                .as_ref()
                .map(|db| std::path::absolute(db).unwrap_or_else(|_| db.clone())),
            catch_all: self.catch_all,
            fan_out_workers: self.workers,
            timeout_secs: self.timeout_secs,
            log_level: self.log_level.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the graph store and its schema
    Init(commands::init::InitArgs),

    /// Add topics (vertices) to the graph
    AddTopics(commands::topics::AddTopicsArgs),

    /// Add links from one topic to others
    AddLinks(commands::links::AddLinksArgs),

    /// Show a single topic
    Topic(commands::topic::TopicArgs),

    /// List the neighbors of a topic
    Neighbors(commands::neighbors::NeighborsArgs),

    /// List potential subtopics of a topic
    Subtopics(commands::subtopics::SubtopicsArgs),

    /// Find and mark strongly related topics
    Related(commands::related::RelatedArgs),

    /// Degree and weight maintenance
    #[command(subcommand)]
    Degrees(commands::degrees::DegreesCommand),

    /// Root topic index maintenance and lookup
    #[command(subcommand)]
    Roots(commands::roots::RootsCommand),

    /// Delete weakly connected malformed topics
    Cleanup(commands::cleanup::CleanupArgs),

    /// Show graph counts per partition
    Status(commands::status::StatusArgs),

    /// View and initialize configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.global)?;

    match cli.command {
        Commands::Init(args) => commands::init::execute(args, &cli.global),
        Commands::AddTopics(args) => commands::topics::execute(args, &cli.global),
        Commands::AddLinks(args) => commands::links::execute(args, &cli.global),
        Commands::Topic(args) => commands::topic::execute(args, &cli.global),
        Commands::Neighbors(args) => commands::neighbors::execute(args, &cli.global),
        Commands::Subtopics(args) => commands::subtopics::execute(args, &cli.global),
        Commands::Related(args) => commands::related::execute(args, &cli.global),
        Commands::Degrees(cmd) => commands::degrees::execute(cmd, &cli.global),
        Commands::Roots(cmd) => commands::roots::execute(cmd, &cli.global),
        Commands::Cleanup(args) => commands::cleanup::execute(args, &cli.global),
        Commands::Status(args) => commands::status::execute(args, &cli.global),
        Commands::Config(cmd) => commands::config::execute(cmd, &cli.global),
    }
}

/// Install the stderr subscriber.
///
/// `--quiet` and `--verbose` win over `--log-level` and the `[logging]`
/// section. A config that
/// fails to load falls back to the defaults here; the command reports the
/// error itself.
fn init_logging(global: &GlobalOptions) -> Result<()> {
    let logging = commands::resolve_workspace(global)
        .and_then(|workspace| commands::load_config(global, &workspace))
        .map(|config| config.logging)
        .unwrap_or_else(|_| LoggingConfig::default());

    let log_level = if global.quiet {
        Level::ERROR
    } else if global.verbose {
        Level::DEBUG
    } else {
        logging.level.parse().unwrap_or(Level::INFO)
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(true);

    match logging.format {
        LogFormat::Full => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.compact().finish())?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_from_global_options() {
        let cli = Cli::try_parse_from([
            "topicgraph",
            "status",
            "--workers",
            "4",
            "--catch-all",
            "zero",
            "--timeout-secs",
            "7",
            "--log-level",
            "debug",
        ])
        .unwrap();

        let overrides = cli.global.to_config_overrides();
        assert_eq!(overrides.fan_out_workers, Some(4));
        assert_eq!(overrides.catch_all, Some(CatchAllPolicy::Zero));
        assert_eq!(overrides.timeout_secs, Some(7));
        assert_eq!(overrides.log_level.as_deref(), Some("debug"));
        assert!(overrides.database_file.is_none());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = Cli::try_parse_from(["topicgraph", "status", "--timeout-secs", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}

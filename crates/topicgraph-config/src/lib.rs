//! TopicGraph Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.topicgraph/config.toml`
//! - Local config: `.topicgraph/config.toml` (in workspace)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Highest useful number of fan-out workers (one per edge partition)
pub const MAX_FAN_OUT_WORKERS: usize = 37;

/// Root configuration for TopicGraph.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    pub storage: StorageConfig,
    pub partitioning: PartitioningConfig,
    pub query: QueryConfig,
    pub maintenance: MaintenanceConfig,
    pub logging: LoggingConfig,
}

/// Where the graph database lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for TopicGraph data (default: `.topicgraph`)
    pub data_dir: PathBuf,

    /// Database file; relative paths are resolved against `data_dir`
    pub database_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".topicgraph"),
            database_file: PathBuf::from("graph.db"),
        }
    }
}

/// Edge partitioning configuration.
///
/// ```toml
/// [partitioning]
/// catch_all = "dedicated"  # or "z" or "zero"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PartitioningConfig {
    /// Partition for names that start with neither a letter nor a digit.
    /// Must match the policy the database was created with.
    pub catch_all: CatchAllPolicy,
}

/// Catch-all partition policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatchAllPolicy {
    /// Dedicated `other` partition (default)
    #[default]
    Dedicated,
    /// Fold into the `z` partition
    Z,
    /// Fold into the `0` partition
    Zero,
}

impl std::fmt::Display for CatchAllPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dedicated => write!(f, "dedicated"),
            Self::Z => write!(f, "z"),
            Self::Zero => write!(f, "zero"),
        }
    }
}

impl std::str::FromStr for CatchAllPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dedicated" | "other" => Ok(Self::Dedicated),
            "z" => Ok(Self::Z),
            "zero" | "0" => Ok(Self::Zero),
            _ => Err(format!(
                "Unknown catch-all policy: '{}'. Valid values: dedicated, z, zero",
                s
            )),
        }
    }
}

/// Neighbor query configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    /// Workers per in-neighbor query (1-37)
    pub fan_out_workers: usize,

    /// Deadline for in-neighbor queries in seconds (none by default)
    pub timeout_secs: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            fan_out_workers: 8,
            timeout_secs: None,
        }
    }
}

/// Maintenance job configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Count root subtopics toward vertex weights
    pub include_subtopics_in_weight: bool,

    /// Malformed vertices with fewer neighbors than this are deleted
    pub cleanup_threshold: u64,

    /// Log job progress every this many items
    pub progress_interval: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            include_subtopics_in_weight: true,
            cleanup_threshold: 5,
            progress_interval: 1000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log line format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Full format with timestamps and targets
    #[default]
    Full,
    /// Single-line compact format
    Compact,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override TopicGraph data directory
    pub data_dir: Option<PathBuf>,

    /// Override database file
    pub database_file: Option<PathBuf>,

    /// Override catch-all policy
    pub catch_all: Option<CatchAllPolicy>,

    /// Override fan-out workers
    pub fan_out_workers: Option<usize>,

    /// Override query deadline
    pub timeout_secs: Option<u64>,

    /// Override log level
    pub log_level: Option<String>,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl GraphConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref dir) = overrides.data_dir {
            self.storage.data_dir = dir.clone();
        }

        if let Some(ref file) = overrides.database_file {
            self.storage.database_file = file.clone();
        }

        if let Some(catch_all) = overrides.catch_all {
            self.partitioning.catch_all = catch_all;
        }

        if let Some(workers) = overrides.fan_out_workers {
            self.query.fan_out_workers = workers;
        }

        if let Some(timeout) = overrides.timeout_secs {
            self.query.timeout_secs = Some(timeout);
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_FAN_OUT_WORKERS).contains(&self.query.fan_out_workers) {
            return Err(ConfigError::invalid_value(
                "query.fan_out_workers",
                format!(
                    "must be between 1 and {}, got {}",
                    MAX_FAN_OUT_WORKERS, self.query.fan_out_workers
                ),
            ));
        }
        if self.query.timeout_secs == Some(0) {
            return Err(ConfigError::invalid_value(
                "query.timeout_secs",
                "must be at least 1",
            ));
        }
        if self.maintenance.cleanup_threshold == 0 {
            return Err(ConfigError::invalid_value(
                "maintenance.cleanup_threshold",
                "must be at least 1",
            ));
        }
        if self.maintenance.progress_interval == 0 {
            return Err(ConfigError::invalid_value(
                "maintenance.progress_interval",
                "must be at least 1",
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!(
                    "unknown level '{}'. Valid values: {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }
        Ok(())
    }

    /// Get the effective data directory for a workspace.
    pub fn data_dir(&self, workspace_root: &Path) -> PathBuf {
        if self.storage.data_dir.is_absolute() {
            self.storage.data_dir.clone()
        } else {
            workspace_root.join(&self.storage.data_dir)
        }
    }

    /// Get the database file path for a workspace.
    pub fn database_path(&self, workspace_root: &Path) -> PathBuf {
        if self.storage.database_file.is_absolute() {
            self.storage.database_file.clone()
        } else {
            self.data_dir(workspace_root)
                .join(&self.storage.database_file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = GraphConfig::default();
        assert_eq!(config.storage.data_dir, PathBuf::from(".topicgraph"));
        assert_eq!(config.partitioning.catch_all, CatchAllPolicy::Dedicated);
        assert_eq!(config.query.fan_out_workers, 8);
        assert_eq!(config.query.timeout_secs, None);
        assert!(config.maintenance.include_subtopics_in_weight);
        assert_eq!(config.maintenance.cleanup_threshold, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = GraphConfig::default();
        let overrides = ConfigOverrides {
            data_dir: Some(PathBuf::from("/custom/data")),
            fan_out_workers: Some(4),
            catch_all: Some(CatchAllPolicy::Z),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.storage.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.query.fan_out_workers, 4);
        assert_eq!(config.partitioning.catch_all, CatchAllPolicy::Z);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_database_path_resolution() {
        let config = GraphConfig::default();
        let workspace = PathBuf::from("/home/user/crawl");

        assert_eq!(
            config.database_path(&workspace),
            PathBuf::from("/home/user/crawl/.topicgraph/graph.db")
        );
    }

    #[test]
    fn test_database_path_absolute() {
        let mut config = GraphConfig::default();
        config.storage.database_file = PathBuf::from("/srv/wiki/topics.db");

        assert_eq!(
            config.database_path(Path::new("/home/user/crawl")),
            PathBuf::from("/srv/wiki/topics.db")
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GraphConfig::default();
        config.query.fan_out_workers = 0;
        assert!(config.validate().is_err());

        config.query.fan_out_workers = 38;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("query.fan_out_workers"));

        let mut config = GraphConfig::default();
        config.query.timeout_secs = Some(0);
        assert!(config.validate().is_err());

        let mut config = GraphConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = GraphConfig::default();
        config.maintenance.cleanup_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_catch_all_policy_parsing() {
        assert_eq!("dedicated".parse::<CatchAllPolicy>(), Ok(CatchAllPolicy::Dedicated));
        assert_eq!("Z".parse::<CatchAllPolicy>(), Ok(CatchAllPolicy::Z));
        assert_eq!("0".parse::<CatchAllPolicy>(), Ok(CatchAllPolicy::Zero));
        assert!("x".parse::<CatchAllPolicy>().is_err());
        assert_eq!(CatchAllPolicy::Zero.to_string(), "zero");
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let toml_str = r#"
            [partitioning]
            catch_all = "zero"

            [query]
            fan_out_workers = 16
            timeout_secs = 30

            [logging]
            format = "compact"
        "#;

        let config: GraphConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.partitioning.catch_all, CatchAllPolicy::Zero);
        assert_eq!(config.query.fan_out_workers, 16);
        assert_eq!(config.query.timeout_secs, Some(30));
        assert_eq!(config.logging.format, LogFormat::Compact);
        // Unset sections keep their defaults
        assert_eq!(config.maintenance, MaintenanceConfig::default());

        let serialized = toml::to_string_pretty(&config).unwrap();
        let back: GraphConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(back, config);
    }
}

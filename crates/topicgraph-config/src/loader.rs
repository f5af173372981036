//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.topicgraph/config.toml`
//! 2. Local config: `.topicgraph/config.toml` (in workspace)
//! 3. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::ConfigError;
use crate::{
    ConfigOverrides, GraphConfig, LoggingConfig, MaintenanceConfig, PartitioningConfig,
    QueryConfig, StorageConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".topicgraph";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".topicgraph";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.topicgraph`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<GraphConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.topicgraph`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a workspace.
    pub fn local_config_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a workspace with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides, then validates
    /// the result.
    pub fn load(
        &mut self,
        workspace_root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<GraphConfig, ConfigError> {
        let mut config = GraphConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(workspace_root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a single config file, bypassing global and local lookup.
    pub fn load_file(
        &self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<GraphConfig, ConfigError> {
        debug!("Loading config from {:?}", path);
        let mut config = merge_configs(GraphConfig::default(), load_config_file(path)?);
        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<GraphConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration for a workspace.
    pub fn load_local(&self, workspace_root: &Path) -> Result<Option<GraphConfig>, ConfigError> {
        let local_path = self.local_config_path(workspace_root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Save configuration to the global config file.
    pub fn save_global(&self, config: &GraphConfig) -> Result<(), ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        save_config_file(&global_dir.join(CONFIG_FILE_NAME), config)
    }

    /// Save configuration to the local config file for a workspace.
    pub fn save_local(&self, workspace_root: &Path, config: &GraphConfig) -> Result<(), ConfigError> {
        save_config_file(&self.local_config_path(workspace_root), config)
    }

    /// Initialize global configuration directory.
    ///
    /// Creates `~/.topicgraph/config.toml` with default configuration.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };
        init_config_dir(global_dir)
    }

    /// Initialize local configuration for a workspace.
    ///
    /// Creates `.topicgraph/config.toml` with default configuration.
    pub fn init_local(&self, workspace_root: &Path) -> Result<PathBuf, ConfigError> {
        init_config_dir(&workspace_root.join(LOCAL_CONFIG_DIR))
    }

    /// Clear cached global configuration.
    ///
    /// Forces reload on next `load_global()` call.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

/// Create `dir/config.toml` with defaults unless it already exists.
fn init_config_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        save_config_file(&config_path, &GraphConfig::default())?;
    }

    Ok(config_path)
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<GraphConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &GraphConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// A field of `overlay` wins when it differs from the default, so partial
/// files only change what they set.
fn merge_configs(base: GraphConfig, overlay: GraphConfig) -> GraphConfig {
    GraphConfig {
        storage: merge_storage(base.storage, overlay.storage),
        partitioning: merge_partitioning(base.partitioning, overlay.partitioning),
        query: merge_query(base.query, overlay.query),
        maintenance: merge_maintenance(base.maintenance, overlay.maintenance),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

/// Pick `overlay` if it was changed from `default`, else `base`.
fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

fn merge_storage(base: StorageConfig, overlay: StorageConfig) -> StorageConfig {
    let default = StorageConfig::default();
    StorageConfig {
        data_dir: pick(base.data_dir, overlay.data_dir, default.data_dir),
        database_file: pick(base.database_file, overlay.database_file, default.database_file),
    }
}

fn merge_partitioning(base: PartitioningConfig, overlay: PartitioningConfig) -> PartitioningConfig {
    PartitioningConfig {
        catch_all: pick(
            base.catch_all,
            overlay.catch_all,
            PartitioningConfig::default().catch_all,
        ),
    }
}

fn merge_query(base: QueryConfig, overlay: QueryConfig) -> QueryConfig {
    let default = QueryConfig::default();
    QueryConfig {
        fan_out_workers: pick(
            base.fan_out_workers,
            overlay.fan_out_workers,
            default.fan_out_workers,
        ),
        timeout_secs: overlay.timeout_secs.or(base.timeout_secs),
    }
}

fn merge_maintenance(base: MaintenanceConfig, overlay: MaintenanceConfig) -> MaintenanceConfig {
    let default = MaintenanceConfig::default();
    MaintenanceConfig {
        include_subtopics_in_weight: pick(
            base.include_subtopics_in_weight,
            overlay.include_subtopics_in_weight,
            default.include_subtopics_in_weight,
        ),
        cleanup_threshold: pick(
            base.cleanup_threshold,
            overlay.cleanup_threshold,
            default.cleanup_threshold,
        ),
        progress_interval: pick(
            base.progress_interval,
            overlay.progress_interval,
            default.progress_interval,
        ),
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    let default = LoggingConfig::default();
    LoggingConfig {
        level: pick(base.level, overlay.level, default.level),
        format: pick(base.format, overlay.format, default.format),
    }
}

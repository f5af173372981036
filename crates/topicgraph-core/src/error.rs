//! Error types for graph storage and queries.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = GraphError> = std::result::Result<T, E>;

/// Errors that can occur during graph operations
#[derive(Debug, Error)]
pub enum GraphError {
    /// The name cannot be stored; raised before any I/O
    #[error("invalid topic name '{name}': {reason}")]
    Validation { name: String, reason: &'static str },

    #[error("Vertex not found: {0}")]
    VertexNotFound(String),

    #[error("Vertex id not found: {0}")]
    VertexIdNotFound(i64),

    /// The database could not be opened or configured
    #[error("failed to open graph database '{path}': {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// One or more in-neighbor workers failed, so the whole query failed
    #[error("in-neighbor fan-out failed on {failed} of {total} workers: {first}")]
    FanOut {
        failed: usize,
        total: usize,
        #[source]
        first: Box<GraphError>,
    },

    #[error("query did not complete within {0:?}")]
    Timeout(Duration),

    #[error("worker pool error: {0}")]
    WorkerPool(String),

    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: String, found: String },

    /// The store was built with a different partition scheme
    #[error("partition scheme mismatch: store uses {stored}, requested {requested}")]
    PartitionSchemeMismatch { stored: String, requested: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// Create a new Validation error.
    pub fn validation(name: impl Into<String>, reason: &'static str) -> Self {
        Self::Validation {
            name: name.into(),
            reason,
        }
    }

    /// Whether a batch job may log this error and move on to the next item.
    ///
    /// Validation and not-found conditions concern a single item. Everything
    /// else means the store itself is unusable for the current operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::VertexNotFound(_) | Self::VertexIdNotFound(_)
        )
    }

    /// Whether this is a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::VertexNotFound(_) | Self::VertexIdNotFound(_))
    }
}

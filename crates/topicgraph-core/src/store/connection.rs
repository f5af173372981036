//! Connection lifecycle for the graph database
//!
//! Every caller that touches the store gets its own connection from the
//! `ConnectionManager`. A connection is used by one thread at a time; each
//! fan-out worker group keeps its own for the life of the engine.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::schema::{full_schema_sql, GRAPH_SCHEMA_VERSION};
use crate::error::{GraphError, Result};
use crate::partition::PartitionScheme;

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Metadata key holding the schema version
const META_SCHEMA_VERSION: &str = "schema_version";

/// Metadata key holding the JSON-encoded partition scheme
const META_PARTITION_SCHEME: &str = "partition_scheme";

/// Supplies connections to one graph database file
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    path: PathBuf,
    scheme: PartitionScheme,
}

impl ConnectionManager {
    /// Open (or create) the database at `path` and prepare its schema.
    ///
    /// Fails if the store was created with a different schema version or a
    /// different partition scheme.
    pub fn open(path: impl AsRef<Path>, scheme: PartitionScheme) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = Self { path, scheme };
        let conn = manager.connect()?;
        conn.init_schema()?;

        info!("Opened graph database at {}", manager.path.display());
        Ok(manager)
    }

    /// Open a fresh connection to the database.
    pub fn connect(&self) -> Result<GraphConnection> {
        let conn = Connection::open(&self.path).map_err(|source| GraphError::Connection {
            path: self.path.clone(),
            source,
        })?;
        configure_connection(&conn).map_err(|source| GraphError::Connection {
            path: self.path.clone(),
            source,
        })?;
        Ok(GraphConnection {
            conn,
            scheme: self.scheme,
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Partition scheme every connection uses
    pub fn scheme(&self) -> PartitionScheme {
        self.scheme
    }
}

/// Configure connection with settings suited to large append-mostly tables
fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    // WAL lets fan-out readers proceed while a crawler appends
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    // Negative value = KB
    conn.pragma_update(None, "cache_size", -64000)?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    // 256MB mmap for the fan-out scans
    conn.pragma_update(None, "mmap_size", 268435456)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

/// A connection to the graph database
pub struct GraphConnection {
    conn: Connection,
    scheme: PartitionScheme,
}

impl GraphConnection {
    /// Create an in-memory graph database (for testing)
    pub fn in_memory(scheme: PartitionScheme) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure_connection(&conn)?;
        let graph = Self { conn, scheme };
        graph.init_schema()?;
        Ok(graph)
    }

    /// The underlying SQLite connection
    pub(crate) fn raw(&self) -> &Connection {
        &self.conn
    }

    /// Partition scheme for edge placement
    pub fn scheme(&self) -> &PartitionScheme {
        &self.scheme
    }

    /// Create missing tables and verify the stored version and scheme
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(&full_schema_sql())?;

        match self.get_metadata(META_SCHEMA_VERSION)? {
            Some(found) if found != GRAPH_SCHEMA_VERSION => {
                return Err(GraphError::SchemaVersionMismatch {
                    expected: GRAPH_SCHEMA_VERSION.to_string(),
                    found,
                });
            }
            Some(_) => {}
            None => self.set_metadata(META_SCHEMA_VERSION, GRAPH_SCHEMA_VERSION)?,
        }

        match self.get_metadata(META_PARTITION_SCHEME)? {
            Some(stored) => {
                let stored: PartitionScheme = serde_json::from_str(&stored)?;
                if stored != self.scheme {
                    return Err(GraphError::PartitionSchemeMismatch {
                        stored: stored.catch_all.to_string(),
                        requested: self.scheme.catch_all.to_string(),
                    });
                }
            }
            None => {
                let encoded = serde_json::to_string(&self.scheme)?;
                self.set_metadata(META_PARTITION_SCHEME, &encoded)?;
                debug!("Recorded partition scheme {}", encoded);
            }
        }

        Ok(())
    }

    /// Get a metadata value
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM graph_metadata WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Set a metadata value
    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO graph_metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

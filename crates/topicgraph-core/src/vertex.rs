//! Vertex Store
//!
//! Topics are rows in the `vertices` table. Names are unique ignoring case:
//! the stored `name_key` column holds the lowercased name and carries the
//! uniqueness constraint, while `name` keeps the spelling first seen.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::partition::{PartitionId, PartitionScheme};
use crate::report::BatchReport;
use crate::store::schema::VERTEX_COLUMNS;
use crate::store::GraphConnection;

/// Longest name accepted, in bytes
pub const MAX_NAME_LEN: usize = 512;

/// A topic in the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vertex {
    pub id: i64,
    pub name: String,
    pub weight: i64,
    /// `None` until the degree maintainer has processed this vertex
    pub indegree: Option<i64>,
    pub outdegree: Option<i64>,
}

impl Vertex {
    /// Whether both degree fields have been computed
    pub fn is_processed(&self) -> bool {
        self.indegree.is_some() && self.outdegree.is_some()
    }

    /// Partition holding this vertex's outgoing edges
    pub fn partition(&self, scheme: &PartitionScheme) -> PartitionId {
        scheme.partition_for(&self.name)
    }
}

/// Check that a name can be stored.
///
/// Runs before any I/O.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GraphError::validation(name, "name is empty"));
    }
    if name.contains('\'') {
        return Err(GraphError::validation(name, "contains a quote character"));
    }
    if name.contains('\0') {
        return Err(GraphError::validation(name, "contains a NUL character"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(GraphError::validation(name, "name is longer than 512 bytes"));
    }
    Ok(())
}

/// Case-folded identity of a name
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Whether a name qualifies as a root topic (no `_` and no `#`)
pub fn is_root_name(name: &str) -> bool {
    !name.contains('_') && !name.contains('#')
}

/// Escape `LIKE` wildcards so the text matches literally (escape char `\`)
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn row_to_vertex(row: &rusqlite::Row<'_>) -> rusqlite::Result<Vertex> {
    Ok(Vertex {
        id: row.get(0)?,
        name: row.get(1)?,
        weight: row.get(2)?,
        indegree: row.get(3)?,
        outdegree: row.get(4)?,
    })
}

/// Insert the name unless its key exists; returns the stored row and
/// whether it was newly written.
fn upsert_vertex(conn: &Connection, name: &str) -> Result<(Vertex, bool)> {
    let key = name_key(name);
    let changed = conn.execute(
        "INSERT INTO vertices (name, name_key) VALUES (?1, ?2)
         ON CONFLICT(name_key) DO NOTHING",
        params![name, key],
    )?;

    let vertex = conn.query_row(
        &format!("SELECT {} FROM vertices WHERE name_key = ?1", VERTEX_COLUMNS),
        [&key],
        row_to_vertex,
    )?;
    Ok((vertex, changed > 0))
}

impl GraphConnection {
    // =========================================================================
    // Vertex Operations
    // =========================================================================

    /// Add a vertex, or return the existing one with the same name ignoring case
    pub fn add_vertex(&self, name: &str) -> Result<Vertex> {
        validate_name(name)?;
        let (vertex, inserted) = upsert_vertex(self.raw(), name)?;
        if inserted {
            debug!("Added vertex {} ({})", vertex.name, vertex.id);
        }
        Ok(vertex)
    }

    /// Add many vertices in one transaction.
    ///
    /// Invalid names are logged and counted as rejected.
    pub fn add_vertices<I, S>(&self, names: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tx = self.raw().unchecked_transaction()?;
        let mut report = BatchReport::default();

        for name in names {
            let name = name.as_ref();
            if let Err(e) = validate_name(name) {
                warn!("Skipping vertex: {}", e);
                report.rejected += 1;
                continue;
            }
            let (_, inserted) = upsert_vertex(&tx, name)?;
            if inserted {
                report.inserted += 1;
            } else {
                report.existing += 1;
            }
        }

        tx.commit()?;
        Ok(report)
    }

    /// Look up a vertex by name, ignoring case
    pub fn try_find_vertex(&self, name: &str) -> Result<Option<Vertex>> {
        let vertex = self
            .raw()
            .query_row(
                &format!("SELECT {} FROM vertices WHERE name_key = ?1", VERTEX_COLUMNS),
                [name_key(name)],
                row_to_vertex,
            )
            .optional()?;
        Ok(vertex)
    }

    /// Look up a vertex by name; `VertexNotFound` when absent
    pub fn find_vertex(&self, name: &str) -> Result<Vertex> {
        self.try_find_vertex(name)?
            .ok_or_else(|| GraphError::VertexNotFound(name.to_string()))
    }

    /// Look up a vertex by id; `VertexIdNotFound` when absent
    pub fn get_vertex(&self, id: i64) -> Result<Vertex> {
        self.raw()
            .query_row(
                &format!("SELECT {} FROM vertices WHERE id = ?1", VERTEX_COLUMNS),
                [id],
                row_to_vertex,
            )
            .optional()?
            .ok_or(GraphError::VertexIdNotFound(id))
    }

    /// Vertices whose names match a `LIKE` pattern (`%` and `_` wildcards),
    /// ignoring case
    pub fn find_vertices_by_pattern(&self, pattern: &str) -> Result<Vec<Vertex>> {
        let mut stmt = self.raw().prepare(&format!(
            "SELECT {} FROM vertices WHERE name_key LIKE ?1 ORDER BY id",
            VERTEX_COLUMNS
        ))?;
        let vertices = stmt
            .query_map([name_key(pattern)], row_to_vertex)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vertices)
    }

    /// Vertices whose names start with a literal prefix, ignoring case
    pub fn find_vertices_by_prefix(&self, prefix: &str) -> Result<Vec<Vertex>> {
        let pattern = format!("{}%", escape_like(&name_key(prefix)));
        let mut stmt = self.raw().prepare(&format!(
            "SELECT {} FROM vertices WHERE name_key LIKE ?1 ESCAPE '\\' ORDER BY id",
            VERTEX_COLUMNS
        ))?;
        let vertices = stmt
            .query_map([pattern], row_to_vertex)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vertices)
    }

    /// Total number of vertices
    pub fn count_vertices(&self) -> Result<u64> {
        let count: i64 = self
            .raw()
            .query_row("SELECT COUNT(*) FROM vertices", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

//! Edge Store
//!
//! Edges live in the partition chosen by their source vertex's name, so
//! everything about a vertex's outgoing edges is answered from one table.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::error::Result;
use crate::partition::PartitionId;
use crate::report::BatchReport;
use crate::store::schema::EDGE_COLUMNS;
use crate::store::GraphConnection;
use crate::vertex::Vertex;

/// Edge type used when the caller does not name one
pub const DEFAULT_EDGE_TYPE: &str = "related";

/// Edge type for pairs linked in both directions
pub const STRONGLY_RELATED_EDGE_TYPE: &str = "strongly related";

/// A directed relation between two topics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub id: i64,
    pub source: i64,
    pub target: i64,
    pub edge_type: String,
    pub weight: i64,
    /// Partition the edge is stored in
    pub partition: PartitionId,
}

/// How a caller names the source vertex of an edge query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    ById(i64),
    ByName(String),
}

impl From<i64> for SourceRef {
    fn from(id: i64) -> Self {
        Self::ById(id)
    }
}

impl From<&str> for SourceRef {
    fn from(name: &str) -> Self {
        Self::ByName(name.to_string())
    }
}

impl From<String> for SourceRef {
    fn from(name: String) -> Self {
        Self::ByName(name)
    }
}

/// Outcome of a single edge insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Inserted,
    AlreadyExists,
}

/// Insert an edge by vertex ids; the pair is unique within its partition.
fn insert_edge(
    conn: &Connection,
    partition: PartitionId,
    source: i64,
    target: i64,
    edge_type: &str,
) -> Result<EdgeInsert> {
    let changed = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO {} (source, target, edge_type) VALUES (?1, ?2, ?3)",
            partition.table_name()
        ),
        params![source, target, edge_type],
    )?;
    Ok(if changed > 0 {
        EdgeInsert::Inserted
    } else {
        EdgeInsert::AlreadyExists
    })
}

fn row_to_edge(row: &rusqlite::Row<'_>, partition: PartitionId) -> rusqlite::Result<Edge> {
    Ok(Edge {
        id: row.get(0)?,
        source: row.get(1)?,
        target: row.get(2)?,
        edge_type: row.get(3)?,
        weight: row.get(4)?,
        partition,
    })
}

impl GraphConnection {
    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Resolve a source reference to its vertex
    pub fn resolve_source(&self, source: &SourceRef) -> Result<Vertex> {
        match source {
            SourceRef::ById(id) => self.get_vertex(*id),
            SourceRef::ByName(name) => self.find_vertex(name),
        }
    }

    /// Add an edge between two existing vertices
    pub fn add_edge(&self, source: &str, target: &str, edge_type: &str) -> Result<EdgeInsert> {
        let source = self.find_vertex(source)?;
        let target = self.find_vertex(target)?;
        let partition = source.partition(self.scheme());

        let outcome = insert_edge(self.raw(), partition, source.id, target.id, edge_type)?;
        debug!(
            "Edge {} -> {} in {}: {:?}",
            source.name, target.name, partition, outcome
        );
        Ok(outcome)
    }

    /// Add edges from one source to many targets in one transaction.
    ///
    /// Unknown targets are logged and counted as rejected; an unknown source
    /// fails the whole call.
    pub fn add_edges<I, S>(&self, source: &str, targets: I, edge_type: &str) -> Result<BatchReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let source = self.find_vertex(source)?;
        let partition = source.partition(self.scheme());

        let tx = self.raw().unchecked_transaction()?;
        let mut report = BatchReport::default();

        for target in targets {
            let target = target.as_ref();
            let Some(target) = self.try_find_vertex(target)? else {
                warn!("Skipping edge {} -> {}: target not found", source.name, target);
                report.rejected += 1;
                continue;
            };
            match insert_edge(&tx, partition, source.id, target.id, edge_type)? {
                EdgeInsert::Inserted => report.inserted += 1,
                EdgeInsert::AlreadyExists => report.existing += 1,
            }
        }

        tx.commit()?;
        Ok(report)
    }

    /// The edge from `source` to `target`, if one exists
    pub fn find_edge(&self, source: &str, target: &str) -> Result<Option<Edge>> {
        let source = self.find_vertex(source)?;
        let target = self.find_vertex(target)?;
        self.find_edge_by_ids(&source, target.id)
    }

    pub(crate) fn find_edge_by_ids(&self, source: &Vertex, target: i64) -> Result<Option<Edge>> {
        let partition = source.partition(self.scheme());
        let edge = self
            .raw()
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE source = ?1 AND target = ?2",
                    EDGE_COLUMNS,
                    partition.table_name()
                ),
                params![source.id, target],
                |row| row_to_edge(row, partition),
            )
            .optional()?;
        Ok(edge)
    }

    /// Outgoing edges of a given type
    pub fn find_edges_of_type(
        &self,
        source: impl Into<SourceRef>,
        edge_type: &str,
    ) -> Result<Vec<Edge>> {
        let source = self.resolve_source(&source.into())?;
        let partition = source.partition(self.scheme());

        let mut stmt = self.raw().prepare(&format!(
            "SELECT {} FROM {} WHERE source = ?1 AND edge_type = ?2 ORDER BY id",
            EDGE_COLUMNS,
            partition.table_name()
        ))?;
        let edges = stmt
            .query_map(params![source.id, edge_type], |row| row_to_edge(row, partition))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    /// Names of the vertices `name` links to
    pub fn find_out_neighbors(&self, name: &str) -> Result<BTreeSet<String>> {
        let vertex = self.find_vertex(name)?;
        self.out_neighbors_of(&vertex)
    }

    pub(crate) fn out_neighbors_of(&self, vertex: &Vertex) -> Result<BTreeSet<String>> {
        let partition = vertex.partition(self.scheme());
        let mut stmt = self.raw().prepare(&format!(
            "SELECT DISTINCT v.name FROM {} e JOIN vertices v ON v.id = e.target
             WHERE e.source = ?1",
            partition.table_name()
        ))?;
        let names = stmt
            .query_map([vertex.id], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<String>>>()?;
        Ok(names)
    }

    /// Number of outgoing edges of `name`
    pub fn count_out_edges(&self, name: &str) -> Result<u64> {
        let vertex = self.find_vertex(name)?;
        self.count_out_edges_of(&vertex)
    }

    pub(crate) fn count_out_edges_of(&self, vertex: &Vertex) -> Result<u64> {
        let partition = vertex.partition(self.scheme());
        let count: i64 = self.raw().query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE source = ?1",
                partition.table_name()
            ),
            [vertex.id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Edge count of every partition, including empty ones
    pub fn count_edges_by_partition(&self) -> Result<BTreeMap<PartitionId, u64>> {
        let mut counts = BTreeMap::new();
        for partition in PartitionId::all() {
            let count: i64 = self.raw().query_row(
                &format!("SELECT COUNT(*) FROM {}", partition.table_name()),
                [],
                |row| row.get(0),
            )?;
            counts.insert(partition, count as u64);
        }
        Ok(counts)
    }

    /// Total number of edges across all partitions
    pub fn count_edges(&self) -> Result<u64> {
        Ok(self.count_edges_by_partition()?.values().sum())
    }

    /// Change the type of an existing edge; returns whether it existed
    pub fn set_edge_type(&self, source_id: i64, target_id: i64, edge_type: &str) -> Result<bool> {
        let source = self.get_vertex(source_id)?;
        let partition = source.partition(self.scheme());
        let changed = self.raw().execute(
            &format!(
                "UPDATE {} SET edge_type = ?3 WHERE source = ?1 AND target = ?2",
                partition.table_name()
            ),
            params![source_id, target_id, edge_type],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::partition::PartitionScheme;
    use pretty_assertions::assert_eq;

    fn test_conn() -> GraphConnection {
        let conn = GraphConnection::in_memory(PartitionScheme::default()).unwrap();
        conn.add_vertices(["Apple", "Banana", "Cherry", "(Album)", "9mm"])
            .unwrap();
        conn
    }

    fn rows_in(conn: &GraphConnection, table: &str) -> i64 {
        conn.raw()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_add_edge_and_out_neighbors() {
        let conn = test_conn();
        assert_eq!(
            conn.add_edge("Apple", "Banana", DEFAULT_EDGE_TYPE).unwrap(),
            EdgeInsert::Inserted
        );
        conn.add_edge("apple", "Cherry", DEFAULT_EDGE_TYPE).unwrap();

        let out = conn.find_out_neighbors("APPLE").unwrap();
        assert_eq!(
            out.into_iter().collect::<Vec<_>>(),
            vec!["Banana".to_string(), "Cherry".to_string()]
        );
        assert_eq!(conn.count_out_edges("Apple").unwrap(), 2);
        assert_eq!(rows_in(&conn, "edges_a"), 2);
    }

    #[test]
    fn test_duplicate_edge_suppressed() {
        let conn = test_conn();
        conn.add_edge("Apple", "Banana", DEFAULT_EDGE_TYPE).unwrap();
        assert_eq!(
            conn.add_edge("Apple", "Banana", DEFAULT_EDGE_TYPE).unwrap(),
            EdgeInsert::AlreadyExists
        );
        assert_eq!(rows_in(&conn, "edges_a"), 1);
    }

    #[test]
    fn test_edges_land_in_source_partition() {
        let conn = test_conn();
        conn.add_edge("(Album)", "Apple", DEFAULT_EDGE_TYPE).unwrap();
        conn.add_edge("9mm", "Apple", DEFAULT_EDGE_TYPE).unwrap();

        let counts = conn.count_edges_by_partition().unwrap();
        assert_eq!(counts.len(), 37);
        assert_eq!(counts[&PartitionId::OTHER], 1);
        assert_eq!(counts[&PartitionId::from_suffix("9").unwrap()], 1);
        assert_eq!(counts[&PartitionId::from_suffix("a").unwrap()], 0);
        assert_eq!(conn.count_edges().unwrap(), 2);
    }

    #[test]
    fn test_add_edge_unknown_vertex() {
        let conn = test_conn();
        let err = conn.add_edge("Apple", "Durian", DEFAULT_EDGE_TYPE).unwrap_err();
        assert!(matches!(err, GraphError::VertexNotFound(ref n) if n == "Durian"));
    }

    #[test]
    fn test_add_edges_batch() {
        let conn = test_conn();
        conn.add_edge("Banana", "Apple", DEFAULT_EDGE_TYPE).unwrap();

        let report = conn
            .add_edges("Banana", ["apple", "Cherry", "Durian", "Cherry"], DEFAULT_EDGE_TYPE)
            .unwrap();
        assert_eq!(
            report,
            BatchReport {
                inserted: 1,
                existing: 2,
                rejected: 1,
            }
        );

        let err = conn
            .add_edges("Durian", ["Apple"], DEFAULT_EDGE_TYPE)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_find_edge_and_types() {
        let conn = test_conn();
        conn.add_edge("Apple", "Banana", DEFAULT_EDGE_TYPE).unwrap();
        conn.add_edge("Apple", "Cherry", "see also").unwrap();

        let edge = conn.find_edge("Apple", "Banana").unwrap().unwrap();
        assert_eq!(edge.edge_type, DEFAULT_EDGE_TYPE);
        assert_eq!(edge.partition.suffix(), "a");
        assert!(conn.find_edge("Banana", "Apple").unwrap().is_none());

        let apple = conn.find_vertex("Apple").unwrap();
        let by_id = conn.find_edges_of_type(apple.id, "see also").unwrap();
        let by_name = conn.find_edges_of_type("apple", "see also").unwrap();
        assert_eq!(by_id, by_name);
        assert_eq!(by_id.len(), 1);

        let banana = conn.find_vertex("Banana").unwrap();
        assert!(conn
            .set_edge_type(apple.id, banana.id, STRONGLY_RELATED_EDGE_TYPE)
            .unwrap());
        assert_eq!(
            conn.find_edges_of_type("Apple", STRONGLY_RELATED_EDGE_TYPE)
                .unwrap()
                .len(),
            1
        );
        assert!(!conn
            .set_edge_type(banana.id, apple.id, STRONGLY_RELATED_EDGE_TYPE)
            .unwrap());
    }
}

//! SQLite Schema Definitions for Graph Storage
//!
//! One database file holds the vertex table, the 37 edge partitions, the
//! root topic snapshot and the root subtopic links.

use crate::partition::PartitionId;

/// Schema version for graph databases
pub const GRAPH_SCHEMA_VERSION: &str = "1.0";

/// SQL to create the vertices table
///
/// `name_key` is the case-folded name and carries the uniqueness constraint,
/// so "Elephant" and "elephant" are the same vertex. NULL degrees mean the
/// degree maintainer has not processed the vertex yet.
pub const SCHEMA_CREATE_VERTICES: &str = r#"
CREATE TABLE IF NOT EXISTS vertices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    name_key TEXT NOT NULL UNIQUE,
    weight INTEGER NOT NULL DEFAULT 0,
    indegree INTEGER,
    outdegree INTEGER
)
"#;

/// SQL to create the root topics table
///
/// The primary key is the vertex id of the root topic.
pub const SCHEMA_CREATE_ROOT_TOPICS: &str = r#"
CREATE TABLE IF NOT EXISTS root_topics (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    name_key TEXT NOT NULL,
    weight INTEGER NOT NULL DEFAULT 0,
    indegree INTEGER NOT NULL DEFAULT 0,
    outdegree INTEGER NOT NULL DEFAULT 0
)
"#;

/// SQL to create the root subtopics table
pub const SCHEMA_CREATE_ROOT_SUBTOPICS: &str = r#"
CREATE TABLE IF NOT EXISTS root_subtopics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    root_id INTEGER NOT NULL,
    subtopic_id INTEGER NOT NULL,
    weight INTEGER NOT NULL DEFAULT 0,
    UNIQUE(root_id, subtopic_id)
)
"#;

/// SQL to create the metadata table
pub const SCHEMA_CREATE_METADATA: &str = r#"
CREATE TABLE IF NOT EXISTS graph_metadata (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)
"#;

/// SQL to create indexes for non-partitioned tables
pub const SCHEMA_CREATE_INDEXES: &str = r#"
-- Degree maintainer scans for unprocessed vertices
CREATE INDEX IF NOT EXISTS idx_vertices_indegree ON vertices(indegree);

-- Case-insensitive root topic lookups
CREATE INDEX IF NOT EXISTS idx_root_topics_name_key ON root_topics(name_key);

-- Subtopic lookups in both directions
CREATE INDEX IF NOT EXISTS idx_root_subtopics_root ON root_subtopics(root_id);
CREATE INDEX IF NOT EXISTS idx_root_subtopics_subtopic ON root_subtopics(subtopic_id);
"#;

/// Column names for vertex queries (in order for row mapping)
pub const VERTEX_COLUMNS: &str = "id, name, weight, indegree, outdegree";

/// Column names for edge queries (in order for row mapping)
pub const EDGE_COLUMNS: &str = "id, source, target, edge_type, weight";

/// Column names for root topic queries (in order for row mapping)
pub const ROOT_TOPIC_COLUMNS: &str = "id, name, weight, indegree, outdegree";

/// SQL to create one edge partition and its target index
///
/// `UNIQUE(source, target)` makes duplicate inserts a no-op and doubles as
/// the index for out-neighbor lookups.
pub fn edge_partition_sql(partition: PartitionId) -> String {
    let table = partition.table_name();
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source INTEGER NOT NULL,
    target INTEGER NOT NULL,
    edge_type TEXT NOT NULL DEFAULT 'related',
    weight INTEGER NOT NULL DEFAULT 0,
    UNIQUE(source, target)
);
CREATE INDEX IF NOT EXISTS idx_{table}_target ON {table}(target);
"#
    )
}

/// Full schema script for a new database
pub fn full_schema_sql() -> String {
    let mut sql = String::new();
    for statement in [
        SCHEMA_CREATE_VERTICES,
        SCHEMA_CREATE_ROOT_TOPICS,
        SCHEMA_CREATE_ROOT_SUBTOPICS,
        SCHEMA_CREATE_METADATA,
    ] {
        sql.push_str(statement.trim());
        sql.push_str(";\n");
    }
    sql.push_str(SCHEMA_CREATE_INDEXES);
    for partition in PartitionId::all() {
        sql.push_str(&edge_partition_sql(partition));
    }
    sql
}

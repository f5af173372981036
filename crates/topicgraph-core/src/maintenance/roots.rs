//! Root Topic Index
//!
//! Root topics are vertices whose names contain neither `_` nor `#`. The
//! `root_topics` table is a snapshot of them that can be rebuilt at any
//! time; `root_subtopics` links each root to the vertices whose
//! `_`-separated name tokens include the root's name.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use super::Progress;
use crate::error::{GraphError, Result};
use crate::graph::TopicGraph;
use crate::partition::PartitionId;
use crate::report::MaintenanceReport;
use crate::store::schema::{ROOT_TOPIC_COLUMNS, VERTEX_COLUMNS};
use crate::store::GraphConnection;
use crate::vertex::{escape_like, name_key, row_to_vertex, Vertex};

/// SQL filter selecting root names
const ROOT_NAME_FILTER: &str = "instr(name, '_') = 0 AND instr(name, '#') = 0";

/// Snapshot of a root topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootTopic {
    /// Id of the underlying vertex
    pub id: i64,
    pub name: String,
    pub weight: i64,
    pub indegree: i64,
    pub outdegree: i64,
}

fn row_to_root_topic(row: &rusqlite::Row<'_>) -> rusqlite::Result<RootTopic> {
    Ok(RootTopic {
        id: row.get(0)?,
        name: row.get(1)?,
        weight: row.get(2)?,
        indegree: row.get(3)?,
        outdegree: row.get(4)?,
    })
}

/// Whether `root_key` is one of the `_`-separated tokens of `candidate`
fn has_root_token(candidate: &str, root_key: &str) -> bool {
    name_key(candidate).split('_').any(|token| token == root_key)
}

impl GraphConnection {
    // =========================================================================
    // Root Topics
    // =========================================================================

    /// Root vertices whose names start with a literal prefix
    pub fn identify_root_vertices(&self, prefix: &str) -> Result<Vec<Vertex>> {
        let pattern = format!("{}%", escape_like(&name_key(prefix)));
        let mut stmt = self.raw().prepare(&format!(
            "SELECT {} FROM vertices
             WHERE name_key LIKE ?1 ESCAPE '\\' AND {}
             ORDER BY id",
            VERTEX_COLUMNS, ROOT_NAME_FILTER
        ))?;
        let vertices = stmt
            .query_map([pattern], row_to_vertex)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vertices)
    }

    /// Root vertices whose names start with neither a letter nor a digit
    fn identify_unkeyed_root_vertices(&self) -> Result<Vec<Vertex>> {
        let mut stmt = self.raw().prepare(&format!(
            "SELECT {} FROM vertices
             WHERE NOT (substr(name_key, 1, 1) BETWEEN 'a' AND 'z')
               AND NOT (substr(name_key, 1, 1) BETWEEN '0' AND '9')
               AND {}
             ORDER BY id",
            VERTEX_COLUMNS, ROOT_NAME_FILTER
        ))?;
        let vertices = stmt
            .query_map([], row_to_vertex)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vertices)
    }

    /// Insert or refresh the snapshot row of a root vertex
    fn upsert_root_topic(&self, vertex: &Vertex) -> Result<RootTopic> {
        let outdegree = match vertex.outdegree {
            Some(outdegree) => outdegree,
            None => self.count_out_edges_of(vertex)? as i64,
        };
        let weight = if vertex.weight == 0 {
            outdegree
        } else {
            vertex.weight
        };
        let root = RootTopic {
            id: vertex.id,
            name: vertex.name.clone(),
            weight,
            indegree: vertex.indegree.unwrap_or(0),
            outdegree,
        };

        self.raw().execute(
            "INSERT INTO root_topics (id, name, name_key, weight, indegree, outdegree)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                weight = excluded.weight,
                indegree = excluded.indegree,
                outdegree = excluded.outdegree",
            params![
                root.id,
                root.name,
                name_key(&root.name),
                root.weight,
                root.indegree,
                root.outdegree
            ],
        )?;
        Ok(root)
    }

    /// Rebuild the root topic snapshot, one name prefix at a time
    pub fn generate_root_vertices(&self, progress_interval: u64) -> Result<MaintenanceReport> {
        let mut report = MaintenanceReport::default();
        let mut progress = Progress::new("generate_root_vertices", progress_interval);

        let mut batches = Vec::new();
        for partition in PartitionId::all() {
            if let Some(prefix) = partition.key_char() {
                batches.push((partition.to_string(), prefix.to_string()));
            }
        }

        for (label, prefix) in &batches {
            let vertices = self.identify_root_vertices(prefix)?;
            self.write_root_batch(label, &vertices, &mut report, &mut progress)?;
        }
        let unkeyed = self.identify_unkeyed_root_vertices()?;
        let label = self.scheme().catch_all_partition().to_string();
        self.write_root_batch(&label, &unkeyed, &mut report, &mut progress)?;

        info!("Generated {} root topics", report.processed);
        Ok(report)
    }

    fn write_root_batch(
        &self,
        label: &str,
        vertices: &[Vertex],
        report: &mut MaintenanceReport,
        progress: &mut Progress,
    ) -> Result<()> {
        let tx = self.raw().unchecked_transaction()?;
        for vertex in vertices {
            self.upsert_root_topic(vertex)?;
            report.processed += 1;
            progress.tick();
        }
        tx.commit()?;
        debug!("Root topics for {}: {}", label, vertices.len());
        Ok(())
    }

    /// A root topic by name, ignoring case
    pub fn find_root_topic(&self, name: &str) -> Result<RootTopic> {
        self.raw()
            .query_row(
                &format!(
                    "SELECT {} FROM root_topics WHERE name_key = ?1",
                    ROOT_TOPIC_COLUMNS
                ),
                [name_key(name)],
                row_to_root_topic,
            )
            .optional()?
            .ok_or_else(|| GraphError::VertexNotFound(name.to_string()))
    }

    pub fn list_root_topics(&self) -> Result<Vec<RootTopic>> {
        let mut stmt = self.raw().prepare(&format!(
            "SELECT {} FROM root_topics ORDER BY id",
            ROOT_TOPIC_COLUMNS
        ))?;
        let roots = stmt
            .query_map([], row_to_root_topic)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(roots)
    }

    pub fn count_root_topics(&self) -> Result<u64> {
        let count: i64 = self
            .raw()
            .query_row("SELECT COUNT(*) FROM root_topics", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // =========================================================================
    // Root Subtopics
    // =========================================================================

    /// Root topics that have no subtopic rows yet
    fn roots_without_subtopics(&self) -> Result<Vec<RootTopic>> {
        let mut stmt = self.raw().prepare(&format!(
            "SELECT {} FROM root_topics r
             WHERE NOT EXISTS (SELECT 1 FROM root_subtopics s WHERE s.root_id = r.id)
             ORDER BY id",
            ROOT_TOPIC_COLUMNS
        ))?;
        let roots = stmt
            .query_map([], row_to_root_topic)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(roots)
    }

    /// Link one root to its subtopics; returns the number of links written
    fn insert_subtopics_for(&self, root: &RootTopic) -> Result<u64> {
        let key = name_key(&root.name);
        let candidates: Vec<Vertex> = {
            let mut stmt = self.raw().prepare(&format!(
                "SELECT {} FROM vertices WHERE name_key LIKE ?1 ESCAPE '\\' AND id != ?2",
                VERTEX_COLUMNS
            ))?;
            let pattern = format!("%{}%", escape_like(&key));
            let rows = stmt.query_map(params![pattern, root.id], row_to_vertex)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let tx = self.raw().unchecked_transaction()?;
        let mut linked = 0;
        for candidate in candidates
            .iter()
            .filter(|v| has_root_token(&v.name, &key))
        {
            linked += tx.execute(
                "INSERT OR IGNORE INTO root_subtopics (root_id, subtopic_id, weight)
                 VALUES (?1, ?2, ?3)",
                params![root.id, candidate.id, candidate.weight],
            )? as u64;
        }
        tx.commit()?;
        Ok(linked)
    }

    /// Link every unprocessed root topic to its subtopics.
    ///
    /// Roots that already have links are skipped, so the job resumes after
    /// an interruption. Roots without any subtopic stay unprocessed.
    pub fn insert_root_subtopics(&self, progress_interval: u64) -> Result<MaintenanceReport> {
        let mut report = MaintenanceReport::default();
        let mut progress = Progress::new("insert_root_subtopics", progress_interval);

        let total_roots = self.count_root_topics()?;
        let pending = self.roots_without_subtopics()?;
        report.skipped = total_roots.saturating_sub(pending.len() as u64);

        for root in &pending {
            let linked = self.insert_subtopics_for(root)?;
            debug!("Root {}: {} subtopics", root.name, linked);
            report.processed += 1;
            progress.tick();
        }

        info!(
            "Root subtopics: {} roots processed, {} links in total",
            report.processed,
            self.count_root_subtopic_rows()?
        );
        Ok(report)
    }

    /// Subtopic vertices of a root topic
    pub fn find_root_subtopics(&self, name: &str) -> Result<Vec<Vertex>> {
        let root = self.find_root_topic(name)?;
        let columns = VERTEX_COLUMNS
            .split(", ")
            .map(|c| format!("v.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = self.raw().prepare(&format!(
            "SELECT {} FROM root_subtopics s JOIN vertices v ON v.id = s.subtopic_id
             WHERE s.root_id = ?1 ORDER BY v.id",
            columns
        ))?;
        let vertices = stmt
            .query_map([root.id], row_to_vertex)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vertices)
    }

    /// Number of subtopics of `name`; 0 when it is not a root topic
    pub fn count_topic_subtopics(&self, name: &str) -> Result<u64> {
        match self.find_root_topic(name) {
            Ok(root) => self.count_subtopics_of(root.id),
            Err(e) if e.is_not_found() => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn count_subtopics_of(&self, root_id: i64) -> Result<u64> {
        let count: i64 = self.raw().query_row(
            "SELECT COUNT(*) FROM root_subtopics WHERE root_id = ?1",
            [root_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Number of root topics without subtopic links
    pub fn count_unprocessed_subtopics(&self) -> Result<u64> {
        let count: i64 = self.raw().query_row(
            "SELECT COUNT(*) FROM root_topics r
             WHERE NOT EXISTS (SELECT 1 FROM root_subtopics s WHERE s.root_id = r.id)",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Total number of root/subtopic links
    pub fn count_root_subtopic_rows(&self) -> Result<u64> {
        let count: i64 = self
            .raw()
            .query_row("SELECT COUNT(*) FROM root_subtopics", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl TopicGraph {
    // =========================================================================
    // Root Topic Index
    // =========================================================================

    pub fn identify_root_vertices(&self, prefix: &str) -> Result<Vec<Vertex>> {
        self.conn.lock().identify_root_vertices(prefix)
    }

    pub fn generate_root_vertices(&self) -> Result<MaintenanceReport> {
        self.conn
            .lock()
            .generate_root_vertices(self.options.progress_interval)
    }

    pub fn find_root_topic(&self, name: &str) -> Result<RootTopic> {
        self.conn.lock().find_root_topic(name)
    }

    pub fn list_root_topics(&self) -> Result<Vec<RootTopic>> {
        self.conn.lock().list_root_topics()
    }

    pub fn count_root_topics(&self) -> Result<u64> {
        self.conn.lock().count_root_topics()
    }

    pub fn insert_root_subtopics(&self) -> Result<MaintenanceReport> {
        self.conn
            .lock()
            .insert_root_subtopics(self.options.progress_interval)
    }

    pub fn find_root_subtopics(&self, name: &str) -> Result<Vec<Vertex>> {
        self.conn.lock().find_root_subtopics(name)
    }

    pub fn count_topic_subtopics(&self, name: &str) -> Result<u64> {
        self.conn.lock().count_topic_subtopics(name)
    }

    pub fn count_unprocessed_subtopics(&self) -> Result<u64> {
        self.conn.lock().count_unprocessed_subtopics()
    }
}

//! Cleanup of malformed vertices
//!
//! Crawls pick up section anchors as topics (`Elephant#Habitat`). Those
//! vertices are deleted together with their edges when they are weakly
//! connected; well-connected ones are kept.

use rusqlite::params;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::Progress;
use crate::error::Result;
use crate::graph::TopicGraph;
use crate::report::MaintenanceReport;
use crate::store::schema::VERTEX_COLUMNS;
use crate::store::GraphConnection;
use crate::vertex::{row_to_vertex, Vertex};

/// Neighbor count (per direction) below which a malformed vertex is deleted
pub const DEFAULT_CLEANUP_THRESHOLD: u64 = 5;

/// What happened to a malformed vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CleanupOutcome {
    /// The vertex and its edges were removed
    Deleted { outbound: u64, inbound: u64 },
    /// The vertex is too well connected to delete
    Kept { indegree: u64, outdegree: u64 },
}

/// A malformed vertex with its neighborhood
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupCandidate {
    pub vertex: Vertex,
    pub in_neighbors: BTreeSet<String>,
    pub out_neighbors: BTreeSet<String>,
}

impl CleanupCandidate {
    /// Whether both neighbor counts are below `threshold`
    pub fn is_deletable(&self, threshold: u64) -> bool {
        (self.in_neighbors.len() as u64) < threshold
            && (self.out_neighbors.len() as u64) < threshold
    }
}

impl GraphConnection {
    /// Vertices whose names contain `#`
    pub fn find_malformed_vertices(&self) -> Result<Vec<Vertex>> {
        let mut stmt = self.raw().prepare(&format!(
            "SELECT {} FROM vertices WHERE instr(name, '#') > 0 ORDER BY id",
            VERTEX_COLUMNS
        ))?;
        let vertices = stmt
            .query_map([], row_to_vertex)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vertices)
    }

    /// Delete a vertex, its outbound edges and the given inbound edges in
    /// one transaction. Returns the outbound and inbound edge rows removed.
    ///
    /// Every neighbor that loses an edge is marked unprocessed so the next
    /// `update_degrees` recomputes its degrees and weight.
    fn delete_vertex_with_edges(&self, vertex: &Vertex, sources: &[Vertex]) -> Result<(u64, u64)> {
        let table = vertex.partition(self.scheme()).table_name();
        let tx = self.raw().unchecked_transaction()?;

        tx.execute(
            &format!(
                "UPDATE vertices SET indegree = NULL, outdegree = NULL
                 WHERE id IN (SELECT target FROM {} WHERE source = ?1)",
                table
            ),
            [vertex.id],
        )?;
        let outbound = tx.execute(
            &format!("DELETE FROM {} WHERE source = ?1", table),
            [vertex.id],
        )? as u64;

        let mut inbound = 0;
        for source in sources {
            tx.execute(
                "UPDATE vertices SET indegree = NULL, outdegree = NULL WHERE id = ?1",
                [source.id],
            )?;
            inbound += tx.execute(
                &format!(
                    "DELETE FROM {} WHERE source = ?1 AND target = ?2",
                    source.partition(self.scheme()).table_name()
                ),
                params![source.id, vertex.id],
            )? as u64;
        }

        tx.execute(
            "DELETE FROM root_subtopics WHERE subtopic_id = ?1",
            [vertex.id],
        )?;
        tx.execute("DELETE FROM vertices WHERE id = ?1", [vertex.id])?;
        tx.commit()?;

        Ok((outbound, inbound))
    }
}

impl TopicGraph {
    // =========================================================================
    // Cleanup
    // =========================================================================

    pub fn find_malformed_vertices(&self) -> Result<Vec<Vertex>> {
        self.conn.lock().find_malformed_vertices()
    }

    /// Gather the neighborhood of a vertex without changing anything
    pub fn cleanup_candidate(&self, name: &str) -> Result<CleanupCandidate> {
        let vertex = self.find_vertex(name)?;
        let in_neighbors = self.engine.find_in_neighbors(vertex.id)?;
        let out_neighbors = self.conn.lock().out_neighbors_of(&vertex)?;
        Ok(CleanupCandidate {
            vertex,
            in_neighbors,
            out_neighbors,
        })
    }

    /// Delete a malformed vertex if both its neighbor counts are below
    /// `threshold`
    pub fn delete_malformed_vertex(&self, name: &str, threshold: u64) -> Result<CleanupOutcome> {
        let candidate = self.cleanup_candidate(name)?;
        if !candidate.is_deletable(threshold) {
            return Ok(CleanupOutcome::Kept {
                indegree: candidate.in_neighbors.len() as u64,
                outdegree: candidate.out_neighbors.len() as u64,
            });
        }

        let conn = self.conn.lock();
        let mut sources = Vec::with_capacity(candidate.in_neighbors.len());
        for source in &candidate.in_neighbors {
            match conn.try_find_vertex(source)? {
                Some(vertex) => sources.push(vertex),
                None => warn!("In-neighbor {} of {} vanished", source, name),
            }
        }

        let (outbound, inbound) = conn.delete_vertex_with_edges(&candidate.vertex, &sources)?;
        debug!(
            "Deleted {} with {} outbound and {} inbound edges",
            candidate.vertex.name, outbound, inbound
        );
        Ok(CleanupOutcome::Deleted { outbound, inbound })
    }

    /// Run the cleanup over every malformed vertex
    pub fn delete_malformed_vertices(&self, threshold: u64) -> Result<MaintenanceReport> {
        let malformed = self.find_malformed_vertices()?;
        info!("Found {} malformed vertices", malformed.len());

        let mut report = MaintenanceReport::default();
        let mut progress =
            Progress::new("delete_malformed_vertices", self.options.progress_interval);

        for vertex in &malformed {
            match self.delete_malformed_vertex(&vertex.name, threshold) {
                Ok(CleanupOutcome::Deleted { .. }) => report.processed += 1,
                Ok(CleanupOutcome::Kept { .. }) => report.skipped += 1,
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping cleanup of {}: {}", vertex.name, e);
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }
            progress.tick();
        }

        info!(
            "Cleanup finished: {} deleted, {} kept, {} failed",
            report.processed, report.skipped, report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::DEFAULT_EDGE_TYPE;
    use crate::graph::GraphOptions;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_graph(dir: &TempDir) -> TopicGraph {
        let graph = TopicGraph::open(dir.path().join("graph.db"), GraphOptions::default()).unwrap();
        graph
            .add_vertices(["Elephant", "Elephant#Habitat", "Africa", "Zoo", "Hub#Page"])
            .unwrap();
        graph
            .add_edge("Elephant", "Elephant#Habitat", DEFAULT_EDGE_TYPE)
            .unwrap();
        graph
            .add_edge("Elephant#Habitat", "Africa", DEFAULT_EDGE_TYPE)
            .unwrap();
        graph
    }

    #[test]
    fn test_find_malformed_vertices() {
        let dir = TempDir::new().unwrap();
        let graph = test_graph(&dir);
        let names: Vec<String> = graph
            .find_malformed_vertices()
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["Elephant#Habitat", "Hub#Page"]);
    }

    #[test]
    fn test_delete_weakly_connected() {
        let dir = TempDir::new().unwrap();
        let graph = test_graph(&dir);

        let outcome = graph
            .delete_malformed_vertex("Elephant#Habitat", DEFAULT_CLEANUP_THRESHOLD)
            .unwrap();
        assert_eq!(
            outcome,
            CleanupOutcome::Deleted {
                outbound: 1,
                inbound: 1,
            }
        );
        assert!(graph.try_find_vertex("Elephant#Habitat").unwrap().is_none());
        assert!(graph.find_out_neighbors("Elephant").unwrap().is_empty());
        assert_eq!(graph.count_edges().unwrap(), 0);
    }

    #[test]
    fn test_keep_well_connected() {
        let dir = TempDir::new().unwrap();
        let graph = test_graph(&dir);

        let outcome = graph.delete_malformed_vertex("Elephant#Habitat", 1).unwrap();
        assert_eq!(
            outcome,
            CleanupOutcome::Kept {
                indegree: 1,
                outdegree: 1,
            }
        );
        assert_eq!(graph.count_vertices().unwrap(), 5);
    }

    #[test]
    fn test_delete_malformed_vertices() {
        let dir = TempDir::new().unwrap();
        let graph = test_graph(&dir);
        for source in ["Elephant", "Africa", "Zoo"] {
            graph.add_edge(source, "Hub#Page", DEFAULT_EDGE_TYPE).unwrap();
        }

        let report = graph.delete_malformed_vertices(3).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        assert!(graph.try_find_vertex("Hub#Page").unwrap().is_some());
        assert!(graph.try_find_vertex("Elephant#Habitat").unwrap().is_none());
    }

    #[test]
    fn test_missing_vertex_is_recoverable() {
        let dir = TempDir::new().unwrap();
        let graph = test_graph(&dir);
        let err = graph
            .delete_malformed_vertex("Nope#Nothing", DEFAULT_CLEANUP_THRESHOLD)
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_delete_marks_neighbors_unprocessed() {
        let dir = TempDir::new().unwrap();
        let graph = test_graph(&dir);
        graph.update_degrees().unwrap();
        assert_eq!(graph.count_unprocessed().unwrap(), 0);

        graph
            .delete_malformed_vertex("Elephant#Habitat", DEFAULT_CLEANUP_THRESHOLD)
            .unwrap();

        // Elephant lost an out-edge, Africa an in-edge; Zoo is untouched
        assert!(!graph.find_vertex("Elephant").unwrap().is_processed());
        assert!(!graph.find_vertex("Africa").unwrap().is_processed());
        assert!(graph.find_vertex("Zoo").unwrap().is_processed());

        let report = graph.update_degrees().unwrap();
        assert_eq!(report.processed, 2);
        let elephant = graph.find_vertex("Elephant").unwrap();
        assert_eq!(elephant.outdegree, Some(0));
        assert_eq!(elephant.weight, 0);
        assert_eq!(graph.find_vertex("Africa").unwrap().indegree, Some(0));
    }

    #[test]
    fn test_cleanup_counts_unresolvable_vertices() {
        let dir = TempDir::new().unwrap();
        let graph = test_graph(&dir);
        // A row whose lookup key no longer matches its name
        graph
            .conn
            .lock()
            .raw()
            .execute(
                "INSERT INTO vertices (name, name_key) VALUES ('Ghost#Page', 'ghost-stale')",
                [],
            )
            .unwrap();

        let report = graph
            .delete_malformed_vertices(DEFAULT_CLEANUP_THRESHOLD)
            .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 2);
        assert!(graph.try_find_vertex("Elephant#Habitat").unwrap().is_none());
        assert!(graph.try_find_vertex("Hub#Page").unwrap().is_none());
    }
}

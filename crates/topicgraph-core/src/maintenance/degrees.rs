//! Degree & Weight Maintainer
//!
//! Fills in `indegree`, `outdegree` and `weight` for every vertex whose
//! degrees are still NULL. Each vertex is committed on its own, so an
//! interrupted run picks up where it stopped.

use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::Progress;
use crate::error::{GraphError, Result};
use crate::graph::TopicGraph;
use crate::report::MaintenanceReport;
use crate::store::schema::VERTEX_COLUMNS;
use crate::store::GraphConnection;
use crate::vertex::{row_to_vertex, Vertex};

/// Vertices fetched per page while scanning for unprocessed rows
const PAGE_SIZE: i64 = 1000;

/// How a vertex's weight is derived from its degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightPolicy {
    /// Add the number of root subtopics to the weight
    pub include_subtopics: bool,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self {
            include_subtopics: true,
        }
    }
}

impl WeightPolicy {
    pub fn weight(&self, indegree: i64, outdegree: i64, subtopics: i64) -> i64 {
        if self.include_subtopics {
            indegree + outdegree + subtopics
        } else {
            indegree + outdegree
        }
    }
}

/// Computed statistics of one vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Degrees {
    pub indegree: i64,
    pub outdegree: i64,
    /// Root subtopics counted toward the weight (0 when excluded by policy)
    pub subtopics: i64,
    pub weight: i64,
}

impl GraphConnection {
    /// Next page of unprocessed vertices with ids above `after_id`
    pub fn unprocessed_vertices(&self, after_id: i64, limit: i64) -> Result<Vec<Vertex>> {
        let mut stmt = self.raw().prepare(&format!(
            "SELECT {} FROM vertices
             WHERE (indegree IS NULL OR outdegree IS NULL) AND id > ?1
             ORDER BY id LIMIT ?2",
            VERTEX_COLUMNS
        ))?;
        let vertices = stmt
            .query_map(params![after_id, limit], row_to_vertex)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vertices)
    }

    /// Store computed degrees; `VertexIdNotFound` if the vertex is gone
    pub fn set_vertex_degrees(&self, id: i64, degrees: &Degrees) -> Result<()> {
        let changed = self.raw().execute(
            "UPDATE vertices SET indegree = ?2, outdegree = ?3, weight = ?4 WHERE id = ?1",
            params![id, degrees.indegree, degrees.outdegree, degrees.weight],
        )?;
        if changed == 0 {
            return Err(GraphError::VertexIdNotFound(id));
        }
        Ok(())
    }

    pub fn count_unprocessed(&self) -> Result<u64> {
        let count: i64 = self.raw().query_row(
            "SELECT COUNT(*) FROM vertices WHERE indegree IS NULL OR outdegree IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count_processed(&self) -> Result<u64> {
        let count: i64 = self.raw().query_row(
            "SELECT COUNT(*) FROM vertices WHERE indegree IS NOT NULL AND outdegree IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Mark every vertex unprocessed; returns the number of rows touched
    pub fn reset_degrees(&self) -> Result<u64> {
        let changed = self.raw().execute(
            "UPDATE vertices SET indegree = NULL, outdegree = NULL, weight = 0
             WHERE indegree IS NOT NULL OR outdegree IS NOT NULL OR weight != 0",
            [],
        )?;
        Ok(changed as u64)
    }
}

impl TopicGraph {
    // =========================================================================
    // Degree Maintenance
    // =========================================================================

    /// Compute (without storing) the degrees and weight of `name`
    pub fn compute_degrees(&self, name: &str) -> Result<Degrees> {
        let vertex = self.find_vertex(name)?;
        self.compute_degrees_of(&vertex)
    }

    fn compute_degrees_of(&self, vertex: &Vertex) -> Result<Degrees> {
        let indegree = self.engine.find_in_neighbors(vertex.id)?.len() as i64;

        let (outdegree, subtopics) = {
            let conn = self.conn.lock();
            let outdegree = conn.out_neighbors_of(vertex)?.len() as i64;
            let subtopics = if self.options.weight_policy.include_subtopics {
                conn.count_subtopics_of(vertex.id)? as i64
            } else {
                0
            };
            (outdegree, subtopics)
        };

        Ok(Degrees {
            indegree,
            outdegree,
            subtopics,
            weight: self
                .options
                .weight_policy
                .weight(indegree, outdegree, subtopics),
        })
    }

    /// Compute and store degrees for every unprocessed vertex, in id order
    pub fn update_degrees(&self) -> Result<MaintenanceReport> {
        let mut report = MaintenanceReport::default();
        let mut progress = Progress::new("update_degrees", self.options.progress_interval);
        let mut after_id = 0;

        info!(
            "Updating degrees for {} unprocessed vertices",
            self.count_unprocessed()?
        );

        loop {
            let page = self.conn.lock().unprocessed_vertices(after_id, PAGE_SIZE)?;
            let Some(last) = page.last() else {
                break;
            };
            after_id = last.id;

            for vertex in &page {
                let outcome = self
                    .compute_degrees_of(vertex)
                    .and_then(|degrees| self.conn.lock().set_vertex_degrees(vertex.id, &degrees));

                match outcome {
                    Ok(()) => report.processed += 1,
                    Err(e) if e.is_recoverable() => {
                        warn!("Skipping degrees of {}: {}", vertex.name, e);
                        report.failed += 1;
                    }
                    Err(e) => return Err(e),
                }
                progress.tick();
            }
        }

        info!(
            "Degree update finished: {} processed, {} failed",
            report.processed, report.failed
        );
        Ok(report)
    }

    pub fn count_unprocessed(&self) -> Result<u64> {
        self.conn.lock().count_unprocessed()
    }

    pub fn count_processed(&self) -> Result<u64> {
        self.conn.lock().count_processed()
    }

    /// Force a full recomputation on the next `update_degrees`
    pub fn reset_degrees(&self) -> Result<u64> {
        let reset = self.conn.lock().reset_degrees()?;
        info!("Reset degrees of {} vertices", reset);
        Ok(reset)
    }
}

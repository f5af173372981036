//! TopicGraph facade
//!
//! `TopicGraph` bundles the connection manager, a primary connection for
//! single-partition work and the fan-out engine for in-neighbor scans.
//! Neighbor queries and maintenance jobs add their own `impl TopicGraph`
//! blocks in their modules.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

use crate::edge::{Edge, EdgeInsert, SourceRef};
use crate::error::Result;
use crate::maintenance::cleanup::DEFAULT_CLEANUP_THRESHOLD;
use crate::maintenance::degrees::WeightPolicy;
use crate::neighbors::{FanOutEngine, DEFAULT_FAN_OUT_WORKERS};
use crate::partition::{CatchAll, PartitionId, PartitionScheme};
use crate::report::BatchReport;
use crate::store::{ConnectionManager, GraphConnection};
use crate::vertex::Vertex;

/// Policies a graph is opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphOptions {
    /// Partition for names that start with neither a letter nor a digit
    pub catch_all: CatchAll,
    /// Worker groups per in-neighbor query (clamped to 1..=37)
    pub fan_out_workers: usize,
    pub weight_policy: WeightPolicy,
    /// Malformed vertices with fewer neighbors than this (both directions)
    /// are deleted by the cleanup pass
    pub cleanup_threshold: u64,
    /// Log batch progress every this many items
    pub progress_interval: u64,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            catch_all: CatchAll::default(),
            fan_out_workers: DEFAULT_FAN_OUT_WORKERS,
            weight_policy: WeightPolicy::default(),
            cleanup_threshold: DEFAULT_CLEANUP_THRESHOLD,
            progress_interval: 1000,
        }
    }
}

/// Row counts of a graph store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub vertices: u64,
    pub edges: u64,
    pub edges_by_partition: BTreeMap<PartitionId, u64>,
    pub processed_vertices: u64,
    pub unprocessed_vertices: u64,
    pub root_topics: u64,
    pub root_subtopics: u64,
}

/// A sharded topic graph stored in one SQLite file
pub struct TopicGraph {
    manager: ConnectionManager,
    /// Primary connection; never handed to fan-out workers
    pub(crate) conn: Mutex<GraphConnection>,
    pub(crate) engine: FanOutEngine,
    pub(crate) options: GraphOptions,
}

impl TopicGraph {
    /// Open (or create) the graph at `path`
    pub fn open(path: impl AsRef<Path>, options: GraphOptions) -> Result<Self> {
        let manager = ConnectionManager::open(path, PartitionScheme::new(options.catch_all))?;
        Self::with_manager(manager, options)
    }

    /// Build a graph over an existing connection manager
    pub fn with_manager(manager: ConnectionManager, options: GraphOptions) -> Result<Self> {
        let conn = manager.connect()?;
        let engine = FanOutEngine::new(manager.clone(), options.fan_out_workers)?;
        info!(
            "Topic graph ready: {} ({} fan-out workers, catch-all {})",
            manager.path().display(),
            engine.workers(),
            options.catch_all
        );

        Ok(Self {
            manager,
            conn: Mutex::new(conn),
            engine,
            options,
        })
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// Worker groups used per in-neighbor query
    pub fn fan_out_workers(&self) -> usize {
        self.engine.workers()
    }

    // =========================================================================
    // Vertices
    // =========================================================================

    pub fn add_vertex(&self, name: &str) -> Result<Vertex> {
        self.conn.lock().add_vertex(name)
    }

    pub fn add_vertices<I, S>(&self, names: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.conn.lock().add_vertices(names)
    }

    pub fn find_vertex(&self, name: &str) -> Result<Vertex> {
        self.conn.lock().find_vertex(name)
    }

    pub fn try_find_vertex(&self, name: &str) -> Result<Option<Vertex>> {
        self.conn.lock().try_find_vertex(name)
    }

    pub fn get_vertex(&self, id: i64) -> Result<Vertex> {
        self.conn.lock().get_vertex(id)
    }

    pub fn find_vertices_by_pattern(&self, pattern: &str) -> Result<Vec<Vertex>> {
        self.conn.lock().find_vertices_by_pattern(pattern)
    }

    pub fn find_vertices_by_prefix(&self, prefix: &str) -> Result<Vec<Vertex>> {
        self.conn.lock().find_vertices_by_prefix(prefix)
    }

    pub fn count_vertices(&self) -> Result<u64> {
        self.conn.lock().count_vertices()
    }

    // =========================================================================
    // Edges
    // =========================================================================

    pub fn add_edge(&self, source: &str, target: &str, edge_type: &str) -> Result<EdgeInsert> {
        self.conn.lock().add_edge(source, target, edge_type)
    }

    pub fn add_edges<I, S>(&self, source: &str, targets: I, edge_type: &str) -> Result<BatchReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.conn.lock().add_edges(source, targets, edge_type)
    }

    pub fn find_edge(&self, source: &str, target: &str) -> Result<Option<Edge>> {
        self.conn.lock().find_edge(source, target)
    }

    pub fn find_edges_of_type(
        &self,
        source: impl Into<SourceRef>,
        edge_type: &str,
    ) -> Result<Vec<Edge>> {
        self.conn.lock().find_edges_of_type(source, edge_type)
    }

    pub fn find_out_neighbors(&self, name: &str) -> Result<BTreeSet<String>> {
        self.conn.lock().find_out_neighbors(name)
    }

    pub fn count_out_edges(&self, name: &str) -> Result<u64> {
        self.conn.lock().count_out_edges(name)
    }

    pub fn count_edges(&self) -> Result<u64> {
        self.conn.lock().count_edges()
    }

    pub fn count_edges_by_partition(&self) -> Result<BTreeMap<PartitionId, u64>> {
        self.conn.lock().count_edges_by_partition()
    }

    /// Row counts for every table
    pub fn stats(&self) -> Result<GraphStats> {
        let conn = self.conn.lock();
        let edges_by_partition = conn.count_edges_by_partition()?;
        Ok(GraphStats {
            vertices: conn.count_vertices()?,
            edges: edges_by_partition.values().sum(),
            edges_by_partition,
            processed_vertices: conn.count_processed()?,
            unprocessed_vertices: conn.count_unprocessed()?,
            root_topics: conn.count_root_topics()?,
            root_subtopics: conn.count_root_subtopic_rows()?,
        })
    }
}

impl std::fmt::Debug for TopicGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicGraph")
            .field("path", &self.manager.path())
            .field("engine", &self.engine)
            .field("options", &self.options)
            .finish()
    }
}

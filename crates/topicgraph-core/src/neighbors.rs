//! Neighbor Query Engine
//!
//! Out-neighbors come from the single partition of the source name. Edges
//! *into* a vertex can sit in any partition, so in-neighbor queries fan out:
//!
//! ```text
//! find_in_neighbors("Elephant")
//!   resolve target id (primary connection)
//!   split 37 partitions into k contiguous groups
//!   ┌ worker 1: scan edges_a..edges_e ┐
//!   ├ worker 2: scan edges_f..edges_j ┤ rayon pool (k threads)
//!   └ ...                             ┘
//!   union of per-worker name sets
//! ```
//!
//! Each worker group owns one connection, opened on first use and kept for
//! the life of the engine. A query succeeds only if every worker succeeds.

use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::{BTreeSet, HashSet};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::edge::STRONGLY_RELATED_EDGE_TYPE;
use crate::error::{GraphError, Result};
use crate::graph::TopicGraph;
use crate::partition::{PartitionId, PARTITION_COUNT};
use crate::store::{ConnectionManager, GraphConnection};
use crate::vertex::{is_root_name, name_key};

/// Number of fan-out workers when none is configured
pub const DEFAULT_FAN_OUT_WORKERS: usize = 8;

/// Split partitions into at most `workers` contiguous, disjoint groups whose
/// sizes differ by at most one.
///
/// `workers` is clamped to `1..=partitions.len()`.
pub fn split_partitions(partitions: &[PartitionId], workers: usize) -> Vec<Vec<PartitionId>> {
    if partitions.is_empty() {
        return Vec::new();
    }

    let groups = workers.clamp(1, partitions.len());
    let base = partitions.len() / groups;
    let extra = partitions.len() % groups;

    let mut result = Vec::with_capacity(groups);
    let mut start = 0;
    for i in 0..groups {
        let len = base + usize::from(i < extra);
        result.push(partitions[start..start + len].to_vec());
        start += len;
    }
    result
}

impl GraphConnection {
    /// Names of vertices with an edge into `target`, from the given partitions
    pub fn scan_in_neighbors(
        &self,
        target: i64,
        partitions: &[PartitionId],
    ) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        for partition in partitions {
            let mut stmt = self.raw().prepare(&format!(
                "SELECT v.name FROM {} e JOIN vertices v ON v.id = e.source
                 WHERE e.target = ?1",
                partition.table_name()
            ))?;
            let rows = stmt.query_map([target], |row| row.get::<_, String>(0))?;
            for name in rows {
                names.insert(name?);
            }
        }
        Ok(names)
    }
}

/// Runs in-neighbor scans across all partitions on a fixed-size pool.
///
/// Cloning is cheap; clones share the pool and the worker connections.
#[derive(Clone)]
pub struct FanOutEngine {
    manager: ConnectionManager,
    pool: Arc<ThreadPool>,
    /// One slot per worker group, filled lazily
    connections: Arc<Vec<Mutex<Option<GraphConnection>>>>,
    workers: usize,
}

impl FanOutEngine {
    /// Build an engine with `workers` threads (clamped to `1..=37`)
    pub fn new(manager: ConnectionManager, workers: usize) -> Result<Self> {
        let workers = workers.clamp(1, PARTITION_COUNT);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("topicgraph-fanout-{i}"))
            .build()
            .map_err(|e| GraphError::WorkerPool(format!("rayon pool: {e}")))?;

        let connections = (0..workers).map(|_| Mutex::new(None)).collect();

        Ok(Self {
            manager,
            pool: Arc::new(pool),
            connections: Arc::new(connections),
            workers,
        })
    }

    /// Number of worker groups per query
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Names of all vertices with an edge into the vertex `target`
    pub fn find_in_neighbors(&self, target: i64) -> Result<BTreeSet<String>> {
        let partitions: Vec<PartitionId> = PartitionId::all().collect();
        let groups = split_partitions(&partitions, self.workers);
        let total = groups.len();

        let results: Vec<Result<HashSet<String>>> = self.pool.install(|| {
            groups
                .par_iter()
                .zip(self.connections.par_iter())
                .map(|(group, slot)| self.scan_group(slot, target, group))
                .collect()
        });

        let mut merged = BTreeSet::new();
        let mut failed = 0;
        let mut first = None;
        for result in results {
            match result {
                Ok(names) => merged.extend(names),
                Err(e) => {
                    failed += 1;
                    if first.is_none() {
                        first = Some(e);
                    }
                }
            }
        }

        if let Some(first) = first {
            warn!(
                "In-neighbor scan for {} failed on {}/{} workers: {}",
                target, failed, total, first
            );
            return Err(GraphError::FanOut {
                failed,
                total,
                first: Box::new(first),
            });
        }

        debug!(
            "In-neighbors of {}: {} names from {} workers",
            target,
            merged.len(),
            total
        );
        Ok(merged)
    }

    /// Scan one group on the worker's own connection, opening it if needed.
    ///
    /// A connection whose scan failed is dropped and reopened next time.
    fn scan_group(
        &self,
        slot: &Mutex<Option<GraphConnection>>,
        target: i64,
        group: &[PartitionId],
    ) -> Result<HashSet<String>> {
        let mut slot = slot.lock();
        let conn = match slot.take() {
            Some(conn) => conn,
            None => self.manager.connect()?,
        };
        let names = conn.scan_in_neighbors(target, group)?;
        *slot = Some(conn);
        Ok(names)
    }

    /// Number of worker connections currently open
    pub fn open_connections(&self) -> usize {
        self.connections
            .iter()
            .filter(|slot| slot.lock().is_some())
            .count()
    }

    /// Like `find_in_neighbors`, but gives up after `timeout`.
    ///
    /// The scan keeps running in the background after a timeout; its result
    /// is discarded.
    pub fn find_in_neighbors_within(
        &self,
        target: i64,
        timeout: Duration,
    ) -> Result<BTreeSet<String>> {
        let (tx, rx) = mpsc::channel();
        let engine = self.clone();

        thread::Builder::new()
            .name("topicgraph-fanout-coordinator".to_string())
            .spawn(move || {
                // The receiver is gone if the caller already timed out
                let _ = tx.send(engine.find_in_neighbors(target));
            })
            .map_err(|e| GraphError::WorkerPool(format!("spawn coordinator: {e}")))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(GraphError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(GraphError::WorkerPool(
                "coordinator exited without a result".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for FanOutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutEngine")
            .field("path", &self.manager.path())
            .field("workers", &self.workers)
            .finish()
    }
}

impl TopicGraph {
    // =========================================================================
    // Neighbor Queries
    // =========================================================================

    /// Names of all vertices linking to `name`
    pub fn find_in_neighbors(&self, name: &str) -> Result<BTreeSet<String>> {
        let target = self.find_vertex(name)?;
        self.engine.find_in_neighbors(target.id)
    }

    /// Like `find_in_neighbors`, failing with `Timeout` after `timeout`
    pub fn find_in_neighbors_within(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<BTreeSet<String>> {
        let target = self.find_vertex(name)?;
        self.engine.find_in_neighbors_within(target.id, timeout)
    }

    pub fn count_in_neighbors(&self, name: &str) -> Result<u64> {
        Ok(self.find_in_neighbors(name)?.len() as u64)
    }

    /// Neighbors in either direction whose names contain `name`, ignoring
    /// case, excluding `name` itself
    pub fn find_potential_subtopics(&self, name: &str) -> Result<BTreeSet<String>> {
        let topic = self.find_vertex(name)?;
        let key = name_key(&topic.name);

        let mut neighbors = self.engine.find_in_neighbors(topic.id)?;
        neighbors.extend(self.conn.lock().out_neighbors_of(&topic)?);

        Ok(neighbors
            .into_iter()
            .filter(|n| {
                let candidate = name_key(n);
                candidate != key && candidate.contains(&key)
            })
            .collect())
    }

    /// Out-neighbors of `name` that qualify as root topics
    pub fn find_related_root_topics(&self, name: &str) -> Result<BTreeSet<String>> {
        let mut out = self.find_out_neighbors(name)?;
        out.retain(|n| is_root_name(n));
        Ok(out)
    }

    /// Whether `a` and `b` link to each other
    pub fn strongly_related(&self, a: &str, b: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let a = conn.find_vertex(a)?;
        let b = conn.find_vertex(b)?;
        let forward = conn.find_edge_by_ids(&a, b.id)?.is_some();
        Ok(forward && conn.find_edge_by_ids(&b, a.id)?.is_some())
    }

    /// Neighbors linked with `name` in both directions
    pub fn find_strongly_related(&self, name: &str) -> Result<BTreeSet<String>> {
        let topic = self.find_vertex(name)?;
        let out = self.conn.lock().out_neighbors_of(&topic)?;
        if out.is_empty() {
            return Ok(out);
        }
        let incoming = self.engine.find_in_neighbors(topic.id)?;
        Ok(out.intersection(&incoming).cloned().collect())
    }

    /// Retype both edges of every strongly related pair around `name`.
    ///
    /// Returns the number of pairs marked.
    pub fn mark_strong_relations(&self, name: &str) -> Result<u64> {
        let topic = self.find_vertex(name)?;
        let related = self.find_strongly_related(&topic.name)?;

        let conn = self.conn.lock();
        let mut marked = 0;
        for other in &related {
            let other = conn.find_vertex(other)?;
            conn.set_edge_type(topic.id, other.id, STRONGLY_RELATED_EDGE_TYPE)?;
            conn.set_edge_type(other.id, topic.id, STRONGLY_RELATED_EDGE_TYPE)?;
            marked += 1;
        }
        debug!("Marked {} strong relations around {}", marked, topic.name);
        Ok(marked)
    }
}

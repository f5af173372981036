//! TopicGraph Core - Sharded storage and neighbor queries for topic graphs
//!
//! This crate stores a web-scale hyperlink graph of topics in SQLite:
//! - One vertex table with case-insensitive unique names
//! - 37 edge partitions keyed by the first character of the source name
//! - Single-partition out-neighbor queries
//! - Concurrent fan-out in-neighbor queries across every partition
//! - Resumable maintenance jobs for degrees, weights and root topics
//!
//! # Architecture
//!
//! ```text
//! TopicGraph
//! ├── ConnectionManager (opens one connection per caller/worker)
//! ├── GraphConnection (primary connection, behind a mutex)
//! └── FanOutEngine (fixed-size worker pool for in-neighbor scans)
//!
//! Storage (single SQLite file):
//! ├── vertices
//! ├── edges_a .. edges_z, edges_0 .. edges_9, edges_other
//! ├── root_topics
//! └── root_subtopics
//! ```

pub mod edge;
pub mod error;
pub mod graph;
pub mod maintenance;
pub mod neighbors;
pub mod partition;
pub mod report;
pub mod store;
pub mod vertex;

// Re-exports for convenience
pub use edge::{Edge, EdgeInsert, SourceRef, DEFAULT_EDGE_TYPE, STRONGLY_RELATED_EDGE_TYPE};
pub use error::{GraphError, Result};
pub use graph::{GraphOptions, GraphStats, TopicGraph};
pub use maintenance::cleanup::{CleanupCandidate, CleanupOutcome, DEFAULT_CLEANUP_THRESHOLD};
pub use maintenance::degrees::{Degrees, WeightPolicy};
pub use maintenance::roots::RootTopic;
pub use neighbors::{split_partitions, FanOutEngine, DEFAULT_FAN_OUT_WORKERS};
pub use partition::{CatchAll, PartitionId, PartitionScheme, PARTITION_COUNT};
pub use report::{BatchReport, MaintenanceReport};
pub use store::{ConnectionManager, GraphConnection, GRAPH_SCHEMA_VERSION};
pub use vertex::{is_root_name, name_key, validate_name, Vertex};

//! Common test utilities for integration tests.
//!
//! Builds small on-disk graphs shared across integration test files.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;
use topicgraph_core::{GraphOptions, TopicGraph, DEFAULT_EDGE_TYPE};

/// A graph in a temporary directory; the directory lives as long as this
pub struct TestGraph {
    pub dir: TempDir,
    pub graph: TopicGraph,
}

impl TestGraph {
    pub fn new() -> Self {
        Self::with_options(GraphOptions::default())
    }

    pub fn with_options(options: GraphOptions) -> Self {
        let dir = TempDir::new().unwrap();
        let graph = TopicGraph::open(dir.path().join("graph.db"), options).unwrap();
        Self { dir, graph }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("graph.db")
    }

    /// Reopen the same database with other options
    pub fn reopen(&self, options: GraphOptions) -> TopicGraph {
        TopicGraph::open(self.db_path(), options).unwrap()
    }

    /// Add every name, then an edge for each `(source, target)` pair
    pub fn link(&self, pairs: &[(&str, &str)]) {
        for (source, target) in pairs {
            self.graph.add_vertex(source).unwrap();
            self.graph.add_vertex(target).unwrap();
            self.graph
                .add_edge(source, target, DEFAULT_EDGE_TYPE)
                .unwrap();
        }
    }
}

/// Sources spread over letter, digit and catch-all partitions, all linking
/// to "Elephant"
pub const ELEPHANT_SOURCES: &[&str] = &[
    "Africa",
    "asia",
    "Botswana",
    "Circus",
    "Ivory",
    "Kenya",
    "Mammoth",
    "Quagga",
    "Savanna",
    "Tusk",
    "Zoo",
    "1990s_Wildlife",
    "7_Wonders",
    "(Band)",
    "#Trunk",
    "\u{c9}l\u{e9}phant",
];

/// A graph where every `ELEPHANT_SOURCES` entry links to "Elephant"
pub fn elephant_graph() -> TestGraph {
    let test = TestGraph::new();
    let pairs: Vec<(&str, &str)> = ELEPHANT_SOURCES
        .iter()
        .map(|source| (*source, "Elephant"))
        .collect();
    test.link(&pairs);
    test
}

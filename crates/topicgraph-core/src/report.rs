//! Outcome counters for batch operations

use serde::Serialize;

/// Result of a batch insert (`add_vertices`, `add_edges`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Rows newly written
    pub inserted: u64,
    /// Items that were already present
    pub existing: u64,
    /// Items skipped because they were invalid or unresolved
    pub rejected: u64,
}

impl BatchReport {
    /// Total number of items looked at
    pub fn total(&self) -> u64 {
        self.inserted + self.existing + self.rejected
    }
}

/// Result of a maintenance job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    /// Items updated
    pub processed: u64,
    /// Items looked at but left unchanged
    pub skipped: u64,
    /// Items that hit a recoverable error
    pub failed: u64,
}

impl MaintenanceReport {
    pub fn total(&self) -> u64 {
        self.processed + self.skipped + self.failed
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: MaintenanceReport) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

//! Resumable batch jobs over the graph
//!
//! - `degrees`: in/out degree and weight of every vertex
//! - `roots`: root topic snapshot and root subtopic links
//! - `cleanup`: removal of malformed vertices
//!
//! Jobs share one error policy: recoverable errors (see
//! `GraphError::is_recoverable`) are logged and counted as failed, anything
//! else aborts the job.

pub mod cleanup;
pub mod degrees;
pub mod roots;

use tracing::info;

/// Logs job progress every `interval` items
pub(crate) struct Progress {
    job: &'static str,
    interval: u64,
    seen: u64,
}

impl Progress {
    pub(crate) fn new(job: &'static str, interval: u64) -> Self {
        Self {
            job,
            interval: interval.max(1),
            seen: 0,
        }
    }

    pub(crate) fn tick(&mut self) {
        self.seen += 1;
        if self.seen % self.interval == 0 {
            info!("{}: {} processed", self.job, self.seen);
        }
    }
}

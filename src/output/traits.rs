//! Output sink traits and types
//!
//! This module defines the trait interface for output sinks and the
//! summary handed to them when a run ends.

use crate::record::OutputRecord;
use crate::storage::{RunStatus, StorageError};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary statistics for a finished run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Records written to the sink
    pub saved: u64,

    /// Listing pages processed
    pub list_pages: u64,

    /// Detail pages processed
    pub detail_pages: u64,

    /// Requests dropped after a fatal failure or exhausted retries
    pub failed: u64,

    /// Retry attempts scheduled
    pub retries: u64,

    /// Discovered URLs skipped as already seen
    pub duplicates_skipped: u64,

    /// Whether the run was stopped by a shutdown signal
    pub interrupted: bool,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Creates a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Final status to record for the run
    pub fn status(&self) -> RunStatus {
        if self.interrupted {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        }
    }

    /// Pages fetched and handled successfully
    pub fn pages_processed(&self) -> u64 {
        self.list_pages + self.detail_pages
    }

    /// Saved records per second of wall-clock time
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.saved as f64 / secs
    }
}

/// Trait for output sinks
///
/// A sink receives every emitted record in order and is finalized once when
/// the run ends. Implementations must be thread-safe.
pub trait OutputSink: Send + Sync {
    /// Appends one record
    ///
    /// # Arguments
    ///
    /// * `record` - The job or link record to write
    fn append(&self, record: &OutputRecord) -> OutputResult<()>;

    /// Finalizes the output, performing any cleanup or final writes
    ///
    /// # Arguments
    ///
    /// * `summary` - Statistics for the finished run
    fn finalize(&self, summary: &RunSummary) -> OutputResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_new() {
        let summary = RunSummary::new();
        assert_eq!(summary.saved, 0);
        assert_eq!(summary.pages_processed(), 0);
        assert_eq!(summary.status(), RunStatus::Completed);
    }

    #[test]
    fn test_pages_processed() {
        let summary = RunSummary {
            list_pages: 3,
            detail_pages: 40,
            ..RunSummary::default()
        };
        assert_eq!(summary.pages_processed(), 43);
    }

    #[test]
    fn test_interrupted_status() {
        let summary = RunSummary {
            interrupted: true,
            ..RunSummary::default()
        };
        assert_eq!(summary.status(), RunStatus::Interrupted);
    }

    #[test]
    fn test_rate() {
        let summary = RunSummary {
            saved: 50,
            elapsed: Duration::from_secs(10),
            ..RunSummary::default()
        };
        assert!((summary.rate() - 5.0).abs() < 0.01);
        assert_eq!(RunSummary::new().rate(), 0.0);
    }
}

//! In-memory output sink
//!
//! Collects records in a vector. Used when embedding the crawler as a
//! library and in tests.

use crate::output::traits::{OutputError, OutputResult, OutputSink, RunSummary};
use crate::record::OutputRecord;
use std::sync::Mutex;

/// Sink keeping every record in memory
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<OutputRecord>>,
    summary: Mutex<Option<RunSummary>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records appended so far
    pub fn records(&self) -> Vec<OutputRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The summary passed to `finalize`, if the run has ended
    pub fn summary(&self) -> Option<RunSummary> {
        self.summary.lock().ok().and_then(|s| s.clone())
    }
}

impl OutputSink for MemorySink {
    fn append(&self, record: &OutputRecord) -> OutputResult<()> {
        self.records
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock records: {}", e)))?
            .push(record.clone());
        Ok(())
    }

    fn finalize(&self, summary: &RunSummary) -> OutputResult<()> {
        *self
            .summary
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock summary: {}", e)))? =
            Some(summary.clone());
        Ok(())
    }
}

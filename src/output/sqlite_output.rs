//! SQLite-based output sink implementation
//!
//! This module provides an output sink that records each run and its
//! records in the SQLite storage backend. Jobs are upserted by URL, so
//! repeated runs refresh existing rows instead of duplicating them.

use crate::output::traits::{OutputError, OutputResult, OutputSink, RunSummary};
use crate::record::OutputRecord;
use crate::storage::{SqliteStorage, Storage};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-based output sink
pub struct SqliteSink {
    storage: Mutex<SqliteStorage>,
    run_id: i64,
}

impl SqliteSink {
    /// Opens the database and starts a new run
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration the run uses
    pub fn open(path: &Path, config_hash: &str) -> OutputResult<Self> {
        let storage = SqliteStorage::new(path)?;
        Self::with_storage(storage, config_hash)
    }

    /// Starts a new run on an already opened storage
    pub fn with_storage(mut storage: SqliteStorage, config_hash: &str) -> OutputResult<Self> {
        let run_id = storage.create_run(config_hash)?;
        tracing::debug!("Started storage run {}", run_id);

        Ok(Self {
            storage: Mutex::new(storage),
            run_id,
        })
    }

    /// The run this sink writes to
    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Runs a closure against the underlying storage
    pub fn with_storage_ref<T>(
        &self,
        f: impl FnOnce(&SqliteStorage) -> T,
    ) -> OutputResult<T> {
        let storage = self
            .storage
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock storage: {}", e)))?;
        Ok(f(&storage))
    }
}

impl OutputSink for SqliteSink {
    fn append(&self, record: &OutputRecord) -> OutputResult<()> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock storage: {}", e)))?;

        match record {
            OutputRecord::Job(job) => storage.upsert_job(self.run_id, job)?,
            OutputRecord::Link(link) => storage.upsert_link(self.run_id, link)?,
        }

        Ok(())
    }

    fn finalize(&self, summary: &RunSummary) -> OutputResult<()> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock storage: {}", e)))?;

        storage.finish_run(self.run_id, summary.status(), summary.saved)?;
        tracing::info!(
            "Recorded run {} ({}) with {} records",
            self.run_id,
            summary.status().to_db_string(),
            summary.saved
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{JobRecord, LinkRecord};
    use crate::storage::RunStatus;

    #[test]
    fn test_sink_records_run_and_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.db");
        let sink = SqliteSink::open(&path, "abc123").unwrap();

        sink.append(&JobRecord::new("https://jobs.practicelink.com/jobs/1/").into())
            .unwrap();
        sink.append(&JobRecord::new("https://jobs.practicelink.com/jobs/1/").into())
            .unwrap();
        sink.append(&LinkRecord::new("https://jobs.practicelink.com/jobs/2/").into())
            .unwrap();
        sink.finalize(&RunSummary {
            saved: 3,
            ..RunSummary::default()
        })
        .unwrap();

        let (jobs, links, run) = sink
            .with_storage_ref(|storage| {
                (
                    storage.count_jobs().unwrap(),
                    storage.count_links().unwrap(),
                    storage.get_run(sink.run_id()).unwrap(),
                )
            })
            .unwrap();

        assert_eq!(jobs, 1);
        assert_eq!(links, 1);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.config_hash, "abc123");
        assert_eq!(run.saved_count, 3);
    }

    #[test]
    fn test_each_open_starts_a_new_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.db");

        let first = SqliteSink::open(&path, "h").unwrap().run_id();
        let second = SqliteSink::open(&path, "h").unwrap().run_id();
        assert!(second > first);
    }
}

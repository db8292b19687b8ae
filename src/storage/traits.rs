//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::record::{JobRecord, LinkRecord};
use crate::storage::{RunRecord, RunStatus, StoredJob};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed to persist crawl runs
/// and their records.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Closes a run with its final status and record count
    fn finish_run(&mut self, run_id: i64, status: RunStatus, saved_count: u64)
        -> StorageResult<()>;

    /// Counts all runs
    fn count_runs(&self) -> StorageResult<u64>;

    // ===== Records =====

    /// Inserts a job, or refreshes the stored row when its URL is known
    fn upsert_job(&mut self, run_id: i64, job: &JobRecord) -> StorageResult<()>;

    /// Inserts a link-only record, ignoring URLs already stored
    fn upsert_link(&mut self, run_id: i64, link: &LinkRecord) -> StorageResult<()>;

    /// Lists the most recently seen jobs
    fn list_jobs(&self, limit: usize) -> StorageResult<Vec<StoredJob>>;

    // ===== Statistics =====

    /// Counts stored jobs
    fn count_jobs(&self) -> StorageResult<u64>;

    /// Counts stored link-only records
    fn count_links(&self) -> StorageResult<u64>;

    /// Counts jobs last seen in the given run
    fn count_jobs_in_run(&self, run_id: i64) -> StorageResult<u64>;

    /// Gets job counts per specialty, largest first
    ///
    /// Jobs without a specialty are not counted.
    fn get_specialty_breakdown(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;
}

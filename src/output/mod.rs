//! Output module for emitting crawl records
//!
//! This module handles:
//! - Writing records as JSON Lines
//! - Upserting records into a SQLite database with per-run bookkeeping
//! - Collecting records in memory for embedding and tests
//! - Reporting dataset statistics

mod jsonl;
mod memory;
mod sqlite_output;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;
pub use sqlite_output::SqliteSink;
pub use stats::{load_statistics, print_statistics, JobStatistics};
pub use traits::{OutputError, OutputResult, OutputSink, RunSummary};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;
use std::sync::Arc;

/// Opens the sink selected by the output configuration
///
/// # Arguments
///
/// * `config` - The output configuration
/// * `config_hash` - Hash recorded with SQLite runs
///
/// # Returns
///
/// * `Ok(Arc<dyn OutputSink>)` - A ready sink
/// * `Err(OutputError)` - The file or database could not be opened
pub fn create_sink(config: &OutputConfig, config_hash: &str) -> OutputResult<Arc<dyn OutputSink>> {
    let path = Path::new(&config.path);
    let sink: Arc<dyn OutputSink> = match config.format {
        OutputFormat::Jsonl => Arc::new(JsonLinesSink::create(path)?),
        OutputFormat::Sqlite => Arc::new(SqliteSink::open(path, config_hash)?),
    };
    Ok(sink)
}

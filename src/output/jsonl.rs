//! JSON Lines output sink
//!
//! Writes one JSON object per line. Each record is flushed as it is appended,
//! so an interrupted run leaves only complete lines behind.

use crate::output::traits::{OutputError, OutputResult, OutputSink, RunSummary};
use crate::record::OutputRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Sink writing newline-delimited JSON to a file
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Creates (or truncates) the output file
    ///
    /// Parent directories are created when missing.
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for JsonLinesSink {
    fn append(&self, record: &OutputRecord) -> OutputResult<()> {
        let line = serde_json::to_string(record)?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock writer: {}", e)))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn finalize(&self, summary: &RunSummary) -> OutputResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock writer: {}", e)))?;
        writer.flush()?;

        tracing::info!(
            "Wrote {} records to {}",
            summary.saved,
            self.path.display()
        );
        Ok(())
    }
}

//! Statistics generation from the scraper database
//!
//! This module provides functionality for extracting and displaying
//! dataset statistics from the storage layer (`--stats`).

use crate::storage::{RunRecord, Storage, StorageResult, StoredJob};

/// Number of specialties listed in the breakdown
const TOP_SPECIALTIES: usize = 10;

/// Number of recently seen jobs listed
const RECENT_JOBS: usize = 5;

/// Dataset statistics summary
#[derive(Debug, Clone)]
pub struct JobStatistics {
    /// Number of recorded runs
    pub total_runs: u64,

    /// Distinct jobs stored
    pub total_jobs: u64,

    /// Distinct link-only records stored
    pub total_links: u64,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,

    /// Jobs refreshed by the most recent run
    pub jobs_in_latest_run: u64,

    /// Most common specialties with their job counts
    pub top_specialties: Vec<(String, u64)>,

    /// Jobs seen most recently, newest first
    pub recent_jobs: Vec<StoredJob>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<JobStatistics> {
    let latest_run = storage.get_latest_run()?;
    let jobs_in_latest_run = match &latest_run {
        Some(run) => storage.count_jobs_in_run(run.id)?,
        None => 0,
    };

    Ok(JobStatistics {
        total_runs: storage.count_runs()?,
        total_jobs: storage.count_jobs()?,
        total_links: storage.count_links()?,
        latest_run,
        jobs_in_latest_run,
        top_specialties: storage.get_specialty_breakdown(TOP_SPECIALTIES)?,
        recent_jobs: storage.list_jobs(RECENT_JOBS)?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &JobStatistics) {
    println!("=== Scraper Statistics ===\n");

    println!("Overview:");
    println!("  Runs recorded: {}", stats.total_runs);
    println!("  Jobs stored: {}", stats.total_jobs);
    println!("  Link-only records: {}", stats.total_links);
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest Run (#{}):", run.id);
        println!("  Status: {}", run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Records saved: {}", run.saved_count);
        println!("  Jobs refreshed: {}", stats.jobs_in_latest_run);
        println!("  Config hash: {}", run.config_hash);
        println!();
    }

    if !stats.top_specialties.is_empty() {
        println!("Top Specialties:");
        for (specialty, count) in &stats.top_specialties {
            let percentage = if stats.total_jobs > 0 {
                (*count as f64 / stats.total_jobs as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", specialty, count, percentage);
        }
        println!();
    }

    if !stats.recent_jobs.is_empty() {
        println!("Recently Seen Jobs:");
        for stored in &stats.recent_jobs {
            println!(
                "  {} | {} ({})",
                stored.job.title.as_deref().unwrap_or("(untitled)"),
                stored.job.url,
                stored.last_seen_at
            );
        }
    }
}

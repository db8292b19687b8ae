//! Crawler module for job-listing crawling
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with proxy rotation and failure classification
//! - Job link discovery and next-page resolution on listing pages
//! - Request scheduling, deduplication and budget enforcement
//! - Overall crawl coordination over a bounded worker pool

mod coordinator;
mod fetcher;
mod links;
mod pagination;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, ShutdownSignal};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use links::find_job_links;
pub use pagination::find_next_page;
pub use scheduler::{Scheduler, SchedulerStats};

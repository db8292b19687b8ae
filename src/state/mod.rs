//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlRequest` / `RequestKind`: a LIST or DETAIL unit of work
//! - `RequestState`: the per-request state machine
//! - `CrawlState`: run-wide budgets, counters and the visited set

mod crawl_state;
mod request;

// Re-export main types
pub use crawl_state::CrawlState;
pub use request::{CrawlRequest, RequestKind, RequestState};

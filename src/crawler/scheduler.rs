//! Scheduler for managing the crawl queue and budgets
//!
//! This module handles:
//! - FIFO queue management for pending requests
//! - URL deduplication across seeds, listing pages and pagination
//! - Result and page budget enforcement
//! - Retry bookkeeping through the request state machine
//!
//! The scheduler owns the run's [`CrawlState`]. Only the coordinator holds a
//! scheduler, so every check-then-update on the state happens under a single
//! `&mut` borrow.

use crate::state::{CrawlRequest, CrawlState, RequestState};
use crate::ScraperError;
use std::collections::VecDeque;
use url::Url;

/// Counters kept while scheduling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Requests handed out to workers
    pub dispatched: u64,

    /// Requests put back for another attempt
    pub retried: u64,

    /// Requests dropped after a fatal failure or exhausted retries
    pub dropped: u64,

    /// Discovered URLs skipped because they were already seen
    pub duplicates_skipped: u64,
}

/// Scheduler manages the request queue and run budgets
pub struct Scheduler {
    /// Pending requests, oldest first
    queue: VecDeque<CrawlRequest>,

    /// Run-wide budgets and the visited set
    state: CrawlState,

    /// Attempts allowed after the first failure
    max_retries: u32,

    stats: SchedulerStats,
}

impl Scheduler {
    /// Creates a new scheduler with an empty queue
    pub fn new(state: CrawlState, max_retries: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            state,
            max_retries,
            stats: SchedulerStats::default(),
        }
    }

    /// Enqueues seed URLs as first-page listing requests
    ///
    /// Returns the number of seeds actually enqueued (duplicates are skipped).
    pub fn seed(&mut self, urls: impl IntoIterator<Item = Url>) -> usize {
        let mut added = 0;
        for url in urls {
            if self.state.mark_visited(&url) {
                self.queue.push_back(CrawlRequest::list(url, 1));
                added += 1;
            } else {
                tracing::debug!("Skipping duplicate seed: {}", url);
            }
        }
        added
    }

    /// Gets the next request to dispatch, marked in flight
    ///
    /// Returns `None` when the queue is empty or the result budget is used
    /// up; in the latter case nothing more is fetched.
    pub fn next_request(&mut self) -> Result<Option<CrawlRequest>, ScraperError> {
        if self.state.budget_exhausted() {
            return Ok(None);
        }

        let Some(mut request) = self.queue.pop_front() else {
            return Ok(None);
        };
        request.advance(RequestState::InFlight)?;
        self.stats.dispatched += 1;
        Ok(Some(request))
    }

    /// Enqueues detail requests discovered on a listing page
    ///
    /// Already-seen URLs are skipped. At most `remaining_budget` new requests
    /// are enqueued; URLs past the cap are left unmarked so a later page may
    /// still offer them. Returns the number enqueued.
    pub fn enqueue_details(&mut self, urls: impl IntoIterator<Item = Url>) -> usize {
        let cap = self.state.remaining_budget();
        let mut added: u64 = 0;

        for url in urls {
            if added >= cap {
                break;
            }
            if self.state.mark_visited(&url) {
                self.queue.push_back(CrawlRequest::detail(url));
                added += 1;
            } else {
                tracing::debug!("Skipping already seen job: {}", url);
                self.stats.duplicates_skipped += 1;
            }
        }

        added as usize
    }

    /// Claims discovered URLs for direct emission as link records
    ///
    /// Same dedup and cap rules as [`enqueue_details`](Self::enqueue_details),
    /// but the URLs are returned instead of queued.
    pub fn claim_links(&mut self, urls: impl IntoIterator<Item = Url>) -> Vec<Url> {
        let cap = self.state.remaining_budget();
        let mut claimed = Vec::new();

        for url in urls {
            if claimed.len() as u64 >= cap {
                break;
            }
            if self.state.mark_visited(&url) {
                claimed.push(url);
            } else {
                tracing::debug!("Skipping already seen link: {}", url);
                self.stats.duplicates_skipped += 1;
            }
        }

        claimed
    }

    /// Enqueues the successor of a listing page
    ///
    /// Refused when the page budget or the result budget is reached, or when
    /// the URL was already visited (which also ends pagination loops).
    pub fn enqueue_next_page(&mut self, from: &CrawlRequest, url: Url) -> bool {
        if !self.state.can_paginate(from.page_depth) {
            tracing::debug!(
                "Not following page {} -> {}: budget reached",
                from.page_depth,
                url
            );
            return false;
        }

        if !self.state.mark_visited(&url) {
            tracing::debug!("Pagination loop detected at {}", url);
            self.stats.duplicates_skipped += 1;
            return false;
        }

        self.queue.push_back(from.next_page(url));
        true
    }

    /// Settles a request whose page was handled
    pub fn settle_success(&mut self, request: &mut CrawlRequest) -> Result<(), ScraperError> {
        request.advance(RequestState::Succeeded)
    }

    /// Settles a failed request
    ///
    /// A transient failure is requeued as a new attempt while
    /// `retry_count < max_retries`; anything else ends in
    /// [`RequestState::FailedTerminal`]. Returns the state the request ends in.
    /// Only an in-flight request can fail.
    pub fn settle_failure(
        &mut self,
        mut request: CrawlRequest,
        transient: bool,
    ) -> Result<RequestState, ScraperError> {
        if !transient {
            request.advance(RequestState::FailedTerminal)?;
            self.stats.dropped += 1;
            return Ok(request.state());
        }

        request.advance(RequestState::FailedRetryable)?;
        if request.retry_count < self.max_retries {
            request.advance(RequestState::Pending)?;
            self.queue.push_back(request.next_attempt());
            self.stats.retried += 1;
        } else {
            request.advance(RequestState::FailedTerminal)?;
            self.stats.dropped += 1;
        }
        Ok(request.state())
    }

    /// Counts a request whose worker died without reporting an outcome
    pub fn record_lost(&mut self) {
        self.stats.dropped += 1;
    }

    /// Gets the current crawl state
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Gets a mutable reference to the crawl state
    pub fn state_mut(&mut self) -> &mut CrawlState {
        &mut self.state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Returns the number of pending requests
    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://jobs.practicelink.com{}", path)).unwrap()
    }

    fn job_urls(count: usize) -> Vec<Url> {
        (0..count).map(|i| url(&format!("/jobs/{}/x/y", i))).collect()
    }

    fn scheduler(budget: Option<u64>, pages: u32, retries: u32) -> Scheduler {
        Scheduler::new(CrawlState::new(budget, pages, 10), retries)
    }

    #[test]
    fn test_seed_dedups() {
        let mut s = scheduler(Some(10), 5, 3);
        let added = s.seed(vec![url("/search?a=1"), url("/search?a=1"), url("/search?a=2")]);
        assert_eq!(added, 2);
        assert_eq!(s.queue_size(), 2);
    }

    #[test]
    fn test_fifo_order() {
        let mut s = scheduler(Some(10), 5, 3);
        s.seed(vec![url("/search?a=1")]);
        s.enqueue_details(job_urls(2));

        assert!(s.next_request().unwrap().unwrap().is_list());
        assert_eq!(s.next_request().unwrap().unwrap().url, url("/jobs/0/x/y"));
        assert_eq!(s.next_request().unwrap().unwrap().url, url("/jobs/1/x/y"));
        assert!(s.next_request().unwrap().is_none());
        assert_eq!(s.stats().dispatched, 3);
    }

    #[test]
    fn test_enqueue_details_capped_by_remaining_budget() {
        let mut s = scheduler(Some(5), 5, 3);
        assert_eq!(s.enqueue_details(job_urls(20)), 5);
        assert_eq!(s.queue_size(), 5);

        // Unclaimed URLs stay available
        assert!(!s.state().is_visited(&url("/jobs/10/x/y")));
    }

    #[test]
    fn test_enqueue_details_skips_visited() {
        let mut s = scheduler(None, 5, 3);
        assert_eq!(s.enqueue_details(job_urls(3)), 3);
        assert_eq!(s.enqueue_details(job_urls(4)), 1);
        assert_eq!(s.stats().duplicates_skipped, 3);
    }

    #[test]
    fn test_claim_links() {
        let mut s = scheduler(Some(2), 5, 3);
        let claimed = s.claim_links(job_urls(5));
        assert_eq!(claimed.len(), 2);
        assert!(s.is_empty());
    }

    #[test]
    fn test_next_request_stops_when_budget_exhausted() {
        let mut s = scheduler(Some(1), 5, 3);
        s.enqueue_details(job_urls(1));
        assert!(s.state_mut().try_record_saved());
        assert!(s.next_request().unwrap().is_none());
        assert_eq!(s.queue_size(), 1);
    }

    #[test]
    fn test_pagination_respects_page_budget() {
        let mut s = scheduler(Some(100), 2, 3);
        let first = CrawlRequest::list(url("/search?page=1"), 1);
        assert!(s.enqueue_next_page(&first, url("/search?page=2")));

        let second = s.next_request().unwrap().unwrap();
        assert_eq!(second.page_depth, 2);
        assert!(!s.enqueue_next_page(&second, url("/search?page=3")));
    }

    #[test]
    fn test_pagination_loop_is_cut() {
        let mut s = scheduler(Some(100), 10, 3);
        s.seed(vec![url("/search?page=1")]);
        let first = s.next_request().unwrap().unwrap();
        assert!(!s.enqueue_next_page(&first, url("/search?page=1")));
    }

    #[test]
    fn test_transient_failure_retried_until_limit() {
        let mut s = scheduler(Some(10), 5, 2);
        s.enqueue_details(job_urls(1));

        let mut attempts = 0;
        let mut final_state = RequestState::Pending;
        while let Some(request) = s.next_request().unwrap() {
            attempts += 1;
            final_state = s.settle_failure(request, true).unwrap();
        }

        assert_eq!(attempts, 3);
        assert_eq!(final_state, RequestState::FailedTerminal);
        assert_eq!(s.stats().retried, 2);
        assert_eq!(s.stats().dropped, 1);
    }

    #[test]
    fn test_fatal_failure_not_retried() {
        let mut s = scheduler(Some(10), 5, 3);
        s.enqueue_details(job_urls(1));
        let request = s.next_request().unwrap().unwrap();

        let state = s.settle_failure(request, false).unwrap();
        assert_eq!(state, RequestState::FailedTerminal);
        assert!(s.is_empty());
    }

    #[test]
    fn test_dispatched_request_is_in_flight() {
        let mut s = scheduler(Some(10), 5, 3);
        s.enqueue_details(job_urls(1));
        let mut request = s.next_request().unwrap().unwrap();
        assert_eq!(request.state(), RequestState::InFlight);

        s.settle_success(&mut request).unwrap();
        assert_eq!(request.state(), RequestState::Succeeded);
    }

    #[test]
    fn test_undispatched_request_cannot_fail() {
        let mut s = scheduler(Some(10), 5, 3);
        let request = CrawlRequest::detail(url("/jobs/1/x/y"));

        let result = s.settle_failure(request, true);
        assert!(matches!(
            result,
            Err(ScraperError::InvalidTransition {
                from: RequestState::Pending,
                to: RequestState::FailedRetryable,
            })
        ));
        assert!(s.is_empty());
        assert_eq!(s.stats(), SchedulerStats::default());
    }

    #[test]
    fn test_settled_request_cannot_be_settled_again() {
        let mut s = scheduler(Some(10), 5, 3);
        s.enqueue_details(job_urls(1));
        let mut request = s.next_request().unwrap().unwrap();
        s.settle_success(&mut request).unwrap();

        assert!(s.settle_success(&mut request).is_err());
        assert!(s.settle_failure(request, false).is_err());
        assert_eq!(s.stats().dropped, 0);
    }

    #[test]
    fn test_lost_request_counts_as_dropped() {
        let mut s = scheduler(Some(10), 5, 3);
        s.record_lost();
        assert_eq!(s.stats().dropped, 1);
    }
}

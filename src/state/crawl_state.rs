use crate::url::dedup_key;
use std::collections::HashSet;
use url::Url;

/// Process-wide crawl bookkeeping for a single run
///
/// Owned by the scheduler; all reads and writes go through `&mut self`, which
/// makes check-then-add on the visited set and check-then-increment on the
/// saved counter atomic by construction.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// Records emitted so far
    pub saved_count: u64,

    /// Maximum records to emit (`None` = unbounded)
    pub result_budget: Option<u64>,

    /// Maximum pages per listing chain
    pub page_budget: u32,

    /// Maximum requests in flight
    pub concurrency_limit: usize,

    /// URLs already enqueued at some point during this run
    visited: HashSet<String>,
}

impl CrawlState {
    /// Creates a fresh state with an empty visited set
    pub fn new(result_budget: Option<u64>, page_budget: u32, concurrency_limit: usize) -> Self {
        Self {
            saved_count: 0,
            result_budget,
            page_budget: page_budget.max(1),
            concurrency_limit: concurrency_limit.max(1),
            visited: HashSet::new(),
        }
    }

    /// Marks a URL as visited
    ///
    /// Returns `true` if the URL was new, `false` if it had been seen before.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(dedup_key(url))
    }

    /// Returns true if the URL has been visited
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(&dedup_key(url))
    }

    /// Records that may still be emitted
    pub fn remaining_budget(&self) -> u64 {
        match self.result_budget {
            Some(budget) => budget.saturating_sub(self.saved_count),
            None => u64::MAX,
        }
    }

    /// Returns true once the result budget is used up
    pub fn budget_exhausted(&self) -> bool {
        self.remaining_budget() == 0
    }

    /// Returns true if a listing chain at `page_depth` may advance
    pub fn can_paginate(&self, page_depth: u32) -> bool {
        !self.budget_exhausted() && page_depth < self.page_budget
    }

    /// Claims one slot of the result budget
    ///
    /// Returns `false` (and changes nothing) when the budget is exhausted.
    pub fn try_record_saved(&mut self) -> bool {
        if self.budget_exhausted() {
            return false;
        }
        self.saved_count += 1;
        true
    }

    /// Gives back a slot claimed by [`try_record_saved`](Self::try_record_saved)
    pub fn release_saved(&mut self) {
        self.saved_count = self.saved_count.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://jobs.practicelink.com{}", path)).unwrap()
    }

    #[test]
    fn test_new_state() {
        let state = CrawlState::new(Some(100), 999, 10);
        assert_eq!(state.saved_count, 0);
        assert_eq!(state.visited.len(), 0);
        assert_eq!(state.remaining_budget(), 100);
        assert!(!state.budget_exhausted());
    }

    #[test]
    fn test_mark_visited_is_check_then_add() {
        let mut state = CrawlState::new(Some(10), 999, 10);
        assert!(state.mark_visited(&url("/jobs/1/")));
        assert!(!state.mark_visited(&url("/jobs/1/")));
        assert!(!state.mark_visited(&url("/jobs/1/#apply")));
        assert!(state.is_visited(&url("/jobs/1/")));
        assert_eq!(state.visited.len(), 1);
    }

    #[test]
    fn test_budget_accounting() {
        let mut state = CrawlState::new(Some(2), 999, 10);
        assert!(state.try_record_saved());
        assert!(state.try_record_saved());
        assert!(!state.try_record_saved());
        assert_eq!(state.saved_count, 2);
        assert!(state.budget_exhausted());

        state.release_saved();
        assert_eq!(state.remaining_budget(), 1);
    }

    #[test]
    fn test_unbounded_budget() {
        let mut state = CrawlState::new(None, 999, 10);
        for _ in 0..1000 {
            assert!(state.try_record_saved());
        }
        assert!(!state.budget_exhausted());
    }

    #[test]
    fn test_can_paginate() {
        let mut state = CrawlState::new(Some(1), 3, 10);
        assert!(state.can_paginate(1));
        assert!(state.can_paginate(2));
        assert!(!state.can_paginate(3));

        state.try_record_saved();
        assert!(!state.can_paginate(1));
    }

    #[test]
    fn test_limits_are_clamped() {
        let state = CrawlState::new(Some(5), 0, 0);
        assert_eq!(state.page_budget, 1);
        assert_eq!(state.concurrency_limit, 1);
    }
}

/// Crawl request definitions and the per-request state machine
///
/// Every request carries its [`RequestState`] and moves `Pending → InFlight →
/// {Succeeded, FailedRetryable, FailedTerminal}`; a retryable failure goes back
/// to `Pending` as a new attempt. Illegal moves are rejected.
use crate::ScraperError;
use std::fmt;
use url::Url;

/// What a request is expected to yield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// A search-results page: detail links and maybe a next page
    List,
    /// A single job posting page: one job record
    Detail,
}

impl RequestKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::List => "LIST",
            Self::Detail => "DETAIL",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Absolute URL to fetch
    pub url: Url,

    /// Request kind
    pub kind: RequestKind,

    /// 1-based position in the listing chain (LIST only; 1 for DETAIL)
    pub page_depth: u32,

    /// Number of failed attempts so far
    pub retry_count: u32,

    state: RequestState,
}

impl CrawlRequest {
    /// A listing request at the given depth
    pub fn list(url: Url, page_depth: u32) -> Self {
        Self {
            url,
            kind: RequestKind::List,
            page_depth: page_depth.max(1),
            retry_count: 0,
            state: RequestState::Pending,
        }
    }

    /// A job-detail request
    pub fn detail(url: Url) -> Self {
        Self {
            url,
            kind: RequestKind::Detail,
            page_depth: 1,
            retry_count: 0,
            state: RequestState::Pending,
        }
    }

    /// Where this request is in its lifecycle
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Moves the request to `to`, leaving it unchanged if the move is illegal
    pub fn advance(&mut self, to: RequestState) -> Result<(), ScraperError> {
        self.state = self.state.transition(to)?;
        Ok(())
    }

    /// The same request for its next attempt
    pub fn next_attempt(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }

    /// The successor listing page in this chain
    pub fn next_page(&self, url: Url) -> Self {
        Self::list(url, self.page_depth + 1)
    }

    pub fn is_list(&self) -> bool {
        self.kind == RequestKind::List
    }

    pub fn is_detail(&self) -> bool {
        self.kind == RequestKind::Detail
    }
}

/// Represents the current state of a request in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    // ===== Active States =====
    /// Queued, waiting for a worker
    Pending,

    /// Being fetched and processed by a worker
    InFlight,

    // ===== Outcome States =====
    /// Fetched and handled
    Succeeded,

    /// Failed transiently; eligible for another attempt
    FailedRetryable,

    /// Failed for good; dropped
    FailedTerminal,
}

impl RequestState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedTerminal)
    }

    /// Checks whether moving to `to` is a legal transition
    pub fn can_transition_to(&self, to: RequestState) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::InFlight)
                | (Self::InFlight, Self::Succeeded)
                | (Self::InFlight, Self::FailedRetryable)
                | (Self::InFlight, Self::FailedTerminal)
                | (Self::FailedRetryable, Self::Pending)
                | (Self::FailedRetryable, Self::FailedTerminal)
        )
    }

    /// Performs a transition, rejecting illegal ones
    pub fn transition(self, to: RequestState) -> Result<RequestState, ScraperError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(ScraperError::InvalidTransition { from: self, to })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Succeeded => "succeeded",
            Self::FailedRetryable => "failed_retryable",
            Self::FailedTerminal => "failed_terminal",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://jobs.practicelink.com/jobboard/jobsearchresults").unwrap()
    }

    #[test]
    fn test_list_request_depth_is_at_least_one() {
        let request = CrawlRequest::list(url(), 0);
        assert_eq!(request.page_depth, 1);
        assert!(request.is_list());
    }

    #[test]
    fn test_next_attempt_increments_retry() {
        let request = CrawlRequest::detail(url());
        let retried = request.next_attempt().next_attempt();
        assert_eq!(retried.retry_count, 2);
        assert_eq!(retried.url, request.url);
        assert!(retried.is_detail());
    }

    #[test]
    fn test_next_page_increments_depth() {
        let first = CrawlRequest::list(url(), 1).next_attempt();
        let second = first.next_page(url());
        assert_eq!(second.page_depth, 2);
        assert_eq!(second.retry_count, 0);
    }

    #[test]
    fn test_is_terminal() {
        assert!(!RequestState::Pending.is_terminal());
        assert!(!RequestState::InFlight.is_terminal());
        assert!(!RequestState::FailedRetryable.is_terminal());

        assert!(RequestState::Succeeded.is_terminal());
        assert!(RequestState::FailedTerminal.is_terminal());
    }

    #[test]
    fn test_new_requests_are_pending() {
        assert_eq!(CrawlRequest::detail(url()).state(), RequestState::Pending);
        assert_eq!(
            CrawlRequest::list(url(), 1).next_page(url()).state(),
            RequestState::Pending
        );
    }

    #[test]
    fn test_advance_rejects_illegal_move_and_keeps_state() {
        let mut request = CrawlRequest::detail(url());
        assert!(matches!(
            request.advance(RequestState::Succeeded),
            Err(ScraperError::InvalidTransition {
                from: RequestState::Pending,
                to: RequestState::Succeeded,
            })
        ));
        assert_eq!(request.state(), RequestState::Pending);

        request.advance(RequestState::InFlight).unwrap();
        request.advance(RequestState::Succeeded).unwrap();
        assert_eq!(request.state(), RequestState::Succeeded);
    }

    #[test]
    fn test_legal_transitions() {
        let state = RequestState::Pending
            .transition(RequestState::InFlight)
            .and_then(|s| s.transition(RequestState::FailedRetryable))
            .and_then(|s| s.transition(RequestState::Pending))
            .and_then(|s| s.transition(RequestState::InFlight))
            .and_then(|s| s.transition(RequestState::Succeeded))
            .unwrap();
        assert_eq!(state, RequestState::Succeeded);
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(RequestState::Pending
            .transition(RequestState::Succeeded)
            .is_err());
        assert!(RequestState::Succeeded
            .transition(RequestState::Pending)
            .is_err());
        assert!(matches!(
            RequestState::FailedTerminal.transition(RequestState::InFlight),
            Err(ScraperError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", RequestState::InFlight), "in_flight");
        assert_eq!(format!("{}", RequestKind::Detail), "DETAIL");
    }
}

//! URL handling module
//!
//! This module provides seed URL synthesis, link absolutization and the
//! site-specific path conventions used to recognize job-detail pages.

mod matcher;
mod normalize;

use crate::config::InputConfig;
use crate::UrlResult;
use url::Url;

// Re-export main functions
pub use matcher::{
    is_excluded_section, is_job_detail_path, role_segment, same_host, specialty_segment,
};
pub use normalize::{absolutize, dedup_key, normalize_url};

/// Search endpoint used when no explicit start URL is configured
pub const SEARCH_ENDPOINT: &str = "https://jobs.practicelink.com/jobboard/jobsearchresults";

/// Builds the search-results URL for the given filters
///
/// Each filter is trimmed; empty filters are left out of the query string.
///
/// # Examples
///
/// ```
/// use practicelink_scraper::url::build_search_url;
///
/// let url = build_search_url(Some("Urology"), Some(" CO "), None, None);
/// assert_eq!(
///     url.as_str(),
///     "https://jobs.practicelink.com/jobboard/jobsearchresults?specialty=Urology&state=CO"
/// );
/// ```
pub fn build_search_url(
    specialty: Option<&str>,
    state: Option<&str>,
    city: Option<&str>,
    job_type: Option<&str>,
) -> Url {
    let mut url = Url::parse(SEARCH_ENDPOINT).expect("search endpoint is a valid URL");

    let filters = [
        ("specialty", specialty),
        ("state", state),
        ("city", city),
        ("jobtype", job_type),
    ];

    let present: Vec<(&str, &str)> = filters
        .iter()
        .filter_map(|(key, value)| {
            let value = (*value)?.trim();
            (!value.is_empty()).then_some((*key, value))
        })
        .collect();

    if !present.is_empty() {
        url.query_pairs_mut().extend_pairs(present);
    }

    url
}

/// Resolves the seed URLs for a crawl
///
/// Every non-blank explicit seed is used, in the order `start-urls`,
/// `start-url`, `url`. Without any, a search URL is synthesized from the
/// filters.
pub fn seed_urls(input: &InputConfig) -> UrlResult<Vec<Url>> {
    let explicit: Vec<&String> = input
        .start_urls
        .iter()
        .chain(input.start_url.iter())
        .chain(input.url.iter())
        .filter(|s| !s.trim().is_empty())
        .collect();

    if explicit.is_empty() {
        return Ok(vec![build_search_url(
            input.specialty.as_deref(),
            input.state.as_deref(),
            input.city.as_deref(),
            input.job_type.as_deref(),
        )]);
    }

    explicit.into_iter().map(|s| normalize_url(s)).collect()
}

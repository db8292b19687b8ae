//! Site URL conventions
//!
//! PracticeLink job pages live under
//! `/jobs/<jobId>/<specialty>/<role>/<state>/<company>`.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static JOB_DETAIL_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/jobs/\d+/").unwrap());

static EXCLUDED_SECTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)search|browse|about|contact").unwrap());

/// Index of the specialty segment in a job-detail path
const SPECIALTY_SEGMENT: usize = 2;

/// Index of the role segment in a job-detail path
const ROLE_SEGMENT: usize = 3;

/// Returns true if the path carries a numeric job identifier segment
pub fn is_job_detail_path(url: &Url) -> bool {
    JOB_DETAIL_PATH.is_match(url.path())
}

/// Returns true if the path belongs to a non-job section of the site
pub fn is_excluded_section(url: &Url) -> bool {
    EXCLUDED_SECTIONS.is_match(url.path())
}

/// Returns true if both URLs point at the same host
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
        _ => false,
    }
}

/// The specialty segment of a job-detail URL, hyphens turned into spaces
pub fn specialty_segment(url: &Url) -> Option<String> {
    path_segment(url, SPECIALTY_SEGMENT).map(|s| s.replace('-', " "))
}

/// The role segment of a job-detail URL, hyphens turned into spaces
pub fn role_segment(url: &Url) -> Option<String> {
    path_segment(url, ROLE_SEGMENT).map(|s| s.replace('-', " "))
}

fn path_segment(url: &Url, index: usize) -> Option<String> {
    let segment = url.path_segments()?.nth(index)?.trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

//! Job link discovery on listing pages

use crate::url::{absolutize, dedup_key, is_excluded_section, is_job_detail_path, same_host};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Finds candidate job-detail URLs on a listing page
///
/// # Link Rules
///
/// **Include:**
/// - any link whose path carries a numeric job id (`/jobs/<digits>/`)
/// - same-host links outside the `search`, `browse`, `about` and `contact` sections
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - fragment-only links and hrefs that do not resolve to HTTP(S)
/// - the listing page itself
///
/// URLs are returned in order of first appearance, without duplicates and
/// without fragments.
///
/// # Example
///
/// ```
/// use practicelink_scraper::crawler::find_job_links;
/// use scraper::Html;
/// use url::Url;
///
/// let html = r#"<a href="/jobs/42/urology/urologist/co/acme">A</a><a href="/jobboard/jobsearchresults?page=2">2</a>"#;
/// let base = Url::parse("https://jobs.practicelink.com/jobboard/jobsearchresults").unwrap();
/// let links = find_job_links(&Html::parse_document(html), &base);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].path(), "/jobs/42/urology/urologist/co/acme");
/// ```
pub fn find_job_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    seen.insert(dedup_key(base_url));

    let mut links = Vec::new();
    for element in document.select(&ANCHORS) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(url) = absolutize(href, base_url) else {
            tracing::debug!("Skipping unresolvable link: {}", href);
            continue;
        };

        if !is_candidate(&url, base_url) {
            continue;
        }

        if seen.insert(dedup_key(&url)) {
            links.push(url);
        }
    }

    links
}

fn is_candidate(url: &Url, base_url: &Url) -> bool {
    is_job_detail_path(url) || (same_host(url, base_url) && !is_excluded_section(url))
}

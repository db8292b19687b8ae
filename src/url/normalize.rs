use crate::{UrlError, UrlResult};
use url::Url;

/// Parses an absolute seed URL into its canonical crawl form
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace and parse; reject if malformed
/// 2. Accept only HTTP and HTTPS schemes
/// 3. Require a host
/// 4. Remove the fragment (everything after #)
///
/// # Examples
///
/// ```
/// use practicelink_scraper::url::normalize_url;
///
/// let url = normalize_url(" https://jobs.practicelink.com/jobs/1/#apply ").unwrap();
/// assert_eq!(url.as_str(), "https://jobs.practicelink.com/jobs/1/");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - hrefs that fail to resolve
/// - non-HTTP(S) URLs after resolution
pub fn absolutize(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.host_str()?;

    absolute_url.set_fragment(None);
    Some(absolute_url)
}

/// The identity under which a URL is deduplicated
pub fn dedup_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.into()
}

//! Job detail extraction
//!
//! Turns a parsed job-detail page into a [`JobRecord`]:
//!
//! 1. JSON-LD `JobPosting` data ([`structured`])
//! 2. selector fallbacks for anything still missing ([`fallback`])
//! 3. normalization: title cleaning and description sanitizing
//!    ([`normalize`], [`sanitize`])
//!
//! Extraction never fails; fields that cannot be resolved stay `None`.

pub mod fallback;
pub mod normalize;
pub mod sanitize;
pub mod structured;

use crate::record::JobRecord;
use fallback::{first_match, DetailPage};
use scraper::Html;
use url::Url;

// Re-export main functions
pub use normalize::{clean_title, collapse_whitespace, title_case};
pub use sanitize::{html_to_text, sanitize_html};
pub use structured::{extract_structured, StructuredJob};

/// Builds a job record from a detail page
///
/// `specialty_filter` is the specialty the crawl was filtered on; when set it
/// takes precedence over the specialty encoded in the URL.
///
/// # Examples
///
/// ```
/// use practicelink_scraper::extract::extract_job;
/// use scraper::Html;
/// use url::Url;
///
/// let document = Html::parse_document("<html><body><h1>Urologist Job at Acme in Denver</h1></body></html>");
/// let url = Url::parse("https://jobs.practicelink.com/jobs/1/urology/urologist/co/acme").unwrap();
///
/// let job = extract_job(&document, &url, None);
/// assert_eq!(job.title.as_deref(), Some("Urologist"));
/// assert_eq!(job.specialty.as_deref(), Some("urology"));
/// ```
pub fn extract_job(document: &Html, url: &Url, specialty_filter: Option<&str>) -> JobRecord {
    let page = DetailPage::new(document, url);
    let structured = extract_structured(document).unwrap_or_default();

    let title = non_blank(structured.title)
        .or_else(|| first_match(&page, fallback::TITLE).map(|raw| clean_title(&raw)))
        .filter(|title| !title.is_empty());

    let description_html = structured
        .description_html
        .or_else(|| first_match(&page, fallback::DESCRIPTION))
        .map(|raw| sanitize_html(&raw))
        .filter(|html| !html.is_empty());

    let description_text = description_html
        .as_deref()
        .map(html_to_text)
        .filter(|text| !text.is_empty());

    let specialty = specialty_filter
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| first_match(&page, fallback::SPECIALTY));

    JobRecord {
        title,
        company: non_blank(structured.company).or_else(|| first_match(&page, fallback::COMPANY)),
        specialty,
        location: non_blank(structured.location)
            .or_else(|| first_match(&page, fallback::LOCATION)),
        salary: non_blank(structured.salary).or_else(|| first_match(&page, fallback::SALARY)),
        job_type: non_blank(structured.job_type)
            .or_else(|| first_match(&page, fallback::JOB_TYPE)),
        date_posted: non_blank(structured.date_posted)
            .or_else(|| first_match(&page, fallback::DATE_POSTED)),
        description_html,
        description_text,
        url: url.to_string(),
    }
}

/// Collapses whitespace in a structured value, dropping it if nothing is left
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_URL: &str =
        "https://jobs.practicelink.com/jobs/1234567/hospital-medicine/hospitalist/co/acme-health";

    fn extract(html: &str, specialty: Option<&str>) -> JobRecord {
        let document = Html::parse_document(html);
        let url = Url::parse(DETAIL_URL).unwrap();
        extract_job(&document, &url, specialty)
    }

    #[test]
    fn test_structured_data_wins() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@type": "JobPosting", "title": "Hospitalist",
             "hiringOrganization": {"name": "Acme Health"},
             "description": "<div><p>Nights <b>7on/7off</b></p><style>p{}</style></div>"}
            </script></head>
            <body><h1>Something Else Job at Other</h1><div class="company-name">Other Co</div></body></html>"#;

        let job = extract(html, None);
        assert_eq!(job.title.as_deref(), Some("Hospitalist"));
        assert_eq!(job.company.as_deref(), Some("Acme Health"));
        assert_eq!(
            job.description_html.as_deref(),
            Some("<p>Nights <b>7on/7off</b></p>")
        );
        assert_eq!(job.description_text.as_deref(), Some("Nights 7on/7off"));
        assert_eq!(job.url, DETAIL_URL);
    }

    #[test]
    fn test_fallback_title_is_cleaned() {
        let html = "<html><body><h1>Urologist Job at Acme in Denver</h1></body></html>";
        let job = extract(html, None);
        assert_eq!(job.title.as_deref(), Some("Urologist"));
    }

    #[test]
    fn test_fallback_fields() {
        let html = r#"<html><body>
            <h1 class="job-title">Hospitalist - Nights</h1>
            <div class="employer">Acme Health</div>
            <div class="job-location">Denver, CO</div>
            <span class="salary-range">$300,000</span>
            <span class="job-type">Full Time</span>
            <div class="job-description"><p>Board certified</p><p></p></div>
        </body></html>"#;

        let job = extract(html, None);
        assert_eq!(job.title.as_deref(), Some("Hospitalist"));
        assert_eq!(job.company.as_deref(), Some("Acme Health"));
        assert_eq!(job.location.as_deref(), Some("Denver, CO"));
        assert_eq!(job.salary.as_deref(), Some("$300,000"));
        assert_eq!(job.job_type.as_deref(), Some("Full Time"));
        assert_eq!(job.description_html.as_deref(), Some("<p>Board certified</p>"));
        assert_eq!(job.description_text.as_deref(), Some("Board certified"));
        assert_eq!(job.specialty.as_deref(), Some("hospital medicine"));
    }

    #[test]
    fn test_specialty_filter_overrides_url() {
        let job = extract("<html></html>", Some(" Urology "));
        assert_eq!(job.specialty.as_deref(), Some("Urology"));
    }

    #[test]
    fn test_empty_page_degrades_to_none() {
        let job = extract("<html><body></body></html>", None);
        // The URL path still supplies a title and specialty
        assert_eq!(job.title.as_deref(), Some("Hospitalist"));
        assert_eq!(job.company, None);
        assert_eq!(job.location, None);
        assert_eq!(job.salary, None);
        assert_eq!(job.description_html, None);
        assert_eq!(job.description_text, None);
    }

    #[test]
    fn test_record_serializes_nulls() {
        let job = extract("<html><body></body></html>", None);
        let json = serde_json::to_value(&job).unwrap();
        assert!(json.get("company").unwrap().is_null());
        assert!(json.get("description_text").unwrap().is_null());
    }
}

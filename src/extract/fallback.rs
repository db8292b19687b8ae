//! Selector-based field extraction
//!
//! Used for every field the JSON-LD block did not provide. Each field has an
//! ordered chain of [`Strategy`] values; the first one yielding a non-empty
//! value wins.

use crate::extract::normalize::{collapse_whitespace, title_case};
use crate::url::{is_job_detail_path, role_segment, specialty_segment};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, PoisonError};
use url::Url;

/// Parsed strategy selectors keyed by their CSS text; `None` marks an invalid one
static SELECTOR_CACHE: LazyLock<Mutex<HashMap<&'static str, Option<Selector>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// A parsed detail page together with the URL it was fetched from
#[derive(Clone, Copy)]
pub struct DetailPage<'a> {
    pub document: &'a Html,
    pub url: &'a Url,
}

impl<'a> DetailPage<'a> {
    pub fn new(document: &'a Html, url: &'a Url) -> Self {
        Self { document, url }
    }
}

/// One way of locating a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Collapsed text of the first matching element with any text
    Text(&'static str),
    /// Trimmed attribute value of the first matching element carrying it
    Attr(&'static str, &'static str),
    /// Inner HTML of the first matching element with any text
    InnerHtml(&'static str),
    /// Role segment (else specialty segment) of a job-detail path, title-cased
    UrlTitle,
    /// Specialty segment of a job-detail path
    UrlSpecialty,
    /// Text of the document `<title>`
    PageTitle,
}

impl Strategy {
    /// Applies the strategy to a page
    pub fn apply(&self, page: &DetailPage<'_>) -> Option<String> {
        match *self {
            Self::Text(selector) => {
                select_all(page.document, selector)
                    .into_iter()
                    .find_map(|element| non_empty(text_of(element)))
            }
            Self::Attr(selector, attr) => select_all(page.document, selector)
                .into_iter()
                .find_map(|element| {
                    element
                        .value()
                        .attr(attr)
                        .and_then(|value| non_empty(value.trim().to_string()))
                }),
            Self::InnerHtml(selector) => select_all(page.document, selector)
                .into_iter()
                .find(|element| !text_of(*element).is_empty())
                .and_then(|element| non_empty(element.inner_html().trim().to_string())),
            Self::UrlTitle => {
                if !is_job_detail_path(page.url) {
                    return None;
                }
                role_segment(page.url)
                    .or_else(|| specialty_segment(page.url))
                    .and_then(|segment| non_empty(title_case(&segment)))
            }
            Self::UrlSpecialty => {
                if !is_job_detail_path(page.url) {
                    return None;
                }
                specialty_segment(page.url)
                    .and_then(|segment| non_empty(collapse_whitespace(&segment)))
            }
            Self::PageTitle => Self::Text("title").apply(page),
        }
    }
}

/// Runs a strategy chain, returning the first value produced
pub fn first_match(page: &DetailPage<'_>, chain: &[Strategy]) -> Option<String> {
    chain.iter().find_map(|strategy| strategy.apply(page))
}

pub const TITLE: &[Strategy] = &[
    Strategy::Text(".job-title"),
    Strategy::Text(r#"[class*="job-title"]"#),
    Strategy::Text("h1"),
    Strategy::UrlTitle,
    Strategy::PageTitle,
];

pub const COMPANY: &[Strategy] = &[
    Strategy::Text(".company-name"),
    Strategy::Text(r#"[class*="company"]"#),
    Strategy::Text(r#"[class*="employer"]"#),
    Strategy::Text(r#"[class*="organization"]"#),
];

pub const LOCATION: &[Strategy] = &[
    Strategy::Text(".job-location"),
    Strategy::Text(r#"[class*="location"]"#),
    Strategy::Text(r#"[class*="address"]"#),
];

pub const JOB_TYPE: &[Strategy] = &[
    Strategy::Text(r#"[class*="job-type"]"#),
    Strategy::Text(r#"[class*="employment-type"]"#),
    Strategy::Text(r#"[class*="schedule"]"#),
];

pub const SALARY: &[Strategy] = &[
    Strategy::Text(r#"[class*="salary"]"#),
    Strategy::Text(r#"[class*="compensation"]"#),
    Strategy::Text(r#"[class*="pay"]"#),
];

pub const DATE_POSTED: &[Strategy] = &[
    Strategy::Attr("time[datetime]", "datetime"),
    Strategy::Text(r#"[class*="date-posted"]"#),
    Strategy::Text(r#"[class*="posted"]"#),
];

pub const DESCRIPTION: &[Strategy] = &[
    Strategy::InnerHtml(r#"[class*="job-description"]"#),
    Strategy::InnerHtml(".job-description"),
    Strategy::InnerHtml(".description"),
    Strategy::InnerHtml(r#"[class*="job-details"]"#),
    Strategy::InnerHtml(r#"[class*="job-content"]"#),
    Strategy::InnerHtml(r#"[class*="position-details"]"#),
    Strategy::InnerHtml(".content"),
    Strategy::InnerHtml(".main-content"),
];

pub const SPECIALTY: &[Strategy] = &[Strategy::UrlSpecialty];

fn select_all<'a>(document: &'a Html, css: &'static str) -> Vec<ElementRef<'a>> {
    match cached_selector(css) {
        Some(selector) => document.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// Parses a selector once per process
fn cached_selector(css: &'static str) -> Option<Selector> {
    let mut cache = SELECTOR_CACHE
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    cache
        .entry(css)
        .or_insert_with(|| match Selector::parse(css) {
            Ok(selector) => Some(selector),
            Err(_) => {
                tracing::debug!("Invalid selector: {}", css);
                None
            }
        })
        .clone()
}

/// Text content with nodes joined as written, whitespace collapsed
fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

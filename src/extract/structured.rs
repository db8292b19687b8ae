//! JSON-LD `JobPosting` extraction
//!
//! Detail pages usually embed a schema.org `JobPosting` in a
//! `<script type="application/ld+json">` block. When present it is the most
//! reliable source for most fields.

use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

static LD_JSON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

const JOB_POSTING: &str = "JobPosting";

/// Fields recovered from a `JobPosting` block
///
/// Values are trimmed and never empty; anything missing is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub date_posted: Option<String>,
    pub description_html: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
}

/// Finds the first `JobPosting` in the document's JSON-LD blocks
///
/// Blocks that fail to parse are skipped. Returns `None` when no block holds a
/// `JobPosting`.
pub fn extract_structured(document: &Html) -> Option<StructuredJob> {
    document
        .select(&LD_JSON)
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("Skipping malformed JSON-LD block: {}", e);
                    None
                }
            }
        })
        .find_map(|value| find_job_posting(&value).map(map_job_posting))
}

/// Depth-first search for a `JobPosting` object in arrays and `@graph`s
fn find_job_posting(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_job_posting),
        Value::Object(map) => {
            if is_job_posting(value) {
                return Some(value);
            }
            map.get("@graph").and_then(find_job_posting)
        }
        _ => None,
    }
}

fn is_job_posting(value: &Value) -> bool {
    let type_field = value.get("@type").or_else(|| value.get("type"));
    match type_field {
        Some(Value::String(t)) => t == JOB_POSTING,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(JOB_POSTING)),
        _ => false,
    }
}

fn map_job_posting(posting: &Value) -> StructuredJob {
    StructuredJob {
        title: text_field(posting, "title").or_else(|| text_field(posting, "name")),
        company: posting
            .get("hiringOrganization")
            .and_then(|org| text_field(org, "name")),
        date_posted: text_field(posting, "datePosted"),
        description_html: text_field(posting, "description"),
        location: location(posting),
        salary: salary(posting),
        job_type: posting.get("employmentType").and_then(render_list),
    }
}

fn location(posting: &Value) -> Option<String> {
    let place = match posting.get("jobLocation")? {
        Value::Array(places) => places.first()?,
        other => other,
    };
    let address = place.get("address")?;
    text_field(address, "addressLocality").or_else(|| text_field(address, "addressRegion"))
}

fn salary(posting: &Value) -> Option<String> {
    let base = posting.get("baseSalary")?;
    if let Some(value) = base.get("value") {
        // QuantitativeValue nested under `value`
        if value.is_object() {
            if let Some(text) = text_field(value, "value").or_else(|| text_field(value, "minValue")) {
                return Some(text);
            }
        } else if let Some(text) = render_scalar(value) {
            return Some(text);
        }
    }
    text_field(base, "minValue")
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(render_scalar)
}

/// Renders strings and numbers as trimmed, non-empty text
fn render_scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn render_list(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(render_scalar).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        other => render_scalar(other),
    }
}

//! Output record types
//!
//! A [`JobRecord`] is the canonical unit emitted for every accepted job-detail
//! page. When detail collection is disabled the crawler emits [`LinkRecord`]s
//! instead. Both travel to the output sink wrapped in an [`OutputRecord`].

use serde::{Deserialize, Serialize};

/// Source tag attached to link-only records
pub const SOURCE_TAG: &str = "practicelink.com";

/// Canonical job posting record
///
/// `url` is always present and absolute. Every other field serializes as
/// `null` when it could not be resolved; fields are never omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: Option<String>,
    pub company: Option<String>,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub date_posted: Option<String>,
    pub description_html: Option<String>,
    pub description_text: Option<String>,
    pub url: String,
}

impl JobRecord {
    /// Creates an empty record for the given job URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// A raw job URL emitted without visiting the detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    #[serde(rename = "_source")]
    pub source: String,
}

impl LinkRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: SOURCE_TAG.to_string(),
        }
    }
}

/// Anything the crawler hands to an output sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Job(JobRecord),
    Link(LinkRecord),
}

impl OutputRecord {
    /// The URL this record was produced from
    pub fn url(&self) -> &str {
        match self {
            Self::Job(job) => &job.url,
            Self::Link(link) => &link.url,
        }
    }
}

impl From<JobRecord> for OutputRecord {
    fn from(job: JobRecord) -> Self {
        Self::Job(job)
    }
}

impl From<LinkRecord> for OutputRecord {
    fn from(link: LinkRecord) -> Self {
        Self::Link(link)
    }
}

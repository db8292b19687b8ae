use serde::{Deserialize, Deserializer};

/// Default number of records a run emits
pub const DEFAULT_RESULTS_WANTED: u64 = 100;

/// Default pagination depth per listing chain
pub const DEFAULT_MAX_PAGES: u32 = 999;

/// Main configuration structure for the scraper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What to crawl: search filters, explicit seeds and budgets
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub specialty: Option<String>,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default, rename = "job-type")]
    pub job_type: Option<String>,

    /// Maximum number of records to emit (`None` = unbounded)
    #[serde(
        default = "default_results_wanted",
        rename = "results-wanted",
        deserialize_with = "deserialize_results_wanted"
    )]
    pub results_wanted: Option<u64>,

    /// Maximum pages followed per listing chain
    #[serde(
        default = "default_max_pages",
        rename = "max-pages",
        deserialize_with = "deserialize_max_pages"
    )]
    pub max_pages: u32,

    /// When false, listing links are emitted as records without visiting them
    #[serde(default = "default_true", rename = "collect-details")]
    pub collect_details: bool,

    #[serde(default, rename = "start-url")]
    pub start_url: Option<String>,

    #[serde(default, rename = "start-urls")]
    pub start_urls: Vec<String>,

    #[serde(default)]
    pub url: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            specialty: None,
            state: None,
            city: None,
            job_type: None,
            results_wanted: default_results_wanted(),
            max_pages: default_max_pages(),
            collect_details: true,
            start_url: None,
            start_urls: Vec::new(),
            url: None,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight at once
    #[serde(default = "default_max_concurrency", rename = "max-concurrency")]
    pub max_concurrency: usize,

    /// Retries granted to a request after a transient failure
    #[serde(default = "default_max_retries", rename = "max-retries")]
    pub max_retries: u32,

    /// Per-request handling timeout (seconds)
    #[serde(default = "default_timeout_secs", rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(default = "default_crawler_name", rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(default = "default_crawler_version", rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(default, rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Proxy configuration passed through to the fetch client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    /// Proxy URLs, rotated round-robin per request
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Output sink selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// Upserted rows in a SQLite database
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Path to the dataset file (JSON Lines file or SQLite database)
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: default_output_path(),
        }
    }
}

fn default_results_wanted() -> Option<u64> {
    Some(DEFAULT_RESULTS_WANTED)
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

fn default_true() -> bool {
    true
}

fn default_max_concurrency() -> usize {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_crawler_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_output_path() -> String {
    "./jobs.jsonl".to_string()
}

/// Numeric input as written in TOML; `inf` and `nan` arrive as floats
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Float(f64),
}

impl RawNumber {
    /// Clamps to at least 1; `None` for non-finite values
    fn at_least_one(self) -> Option<u64> {
        match self {
            Self::Int(n) => Some(n.max(1) as u64),
            Self::Float(f) if f.is_finite() => Some((f as i64).max(1) as u64),
            Self::Float(_) => None,
        }
    }
}

fn deserialize_results_wanted<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawNumber::deserialize(deserializer)?.at_least_one())
}

fn deserialize_max_pages<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawNumber::deserialize(deserializer)?
        .at_least_one()
        .map(|n| n.min(u64::from(u32::MAX)) as u32)
        .unwrap_or(DEFAULT_MAX_PAGES))
}

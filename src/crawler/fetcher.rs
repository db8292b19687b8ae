//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent, proxy and cookie store
//! - Rotating across proxies between requests
//! - Classifying failures as transient (retryable) or fatal
//!
//! The fetcher performs exactly one attempt per call; retries belong to the
//! coordinator so that they count against the request's retry budget.

use crate::config::{Config, UserAgentConfig};
use crate::ScraperError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client, Proxy, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

/// Why a fetch failed
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Network error, timeout, 408, 429 or 5xx; worth another attempt
    #[error("transient failure for {url}: {reason}")]
    Transient { url: String, reason: String },

    /// Any other failure; retrying will not help
    #[error("fatal failure for {url}: {reason}")]
    Fatal { url: String, reason: String },
}

impl FetchError {
    pub fn transient(url: &Url, reason: impl Into<String>) -> Self {
        Self::Transient {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn fatal(url: &Url, reason: impl Into<String>) -> Self {
        Self::Fatal {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if the request may be retried
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Classifies a non-success HTTP status
    ///
    /// | Status | Class |
    /// |--------|-------|
    /// | 408, 429 | Transient |
    /// | 5xx | Transient |
    /// | anything else | Fatal |
    pub fn from_status(url: &Url, status: StatusCode) -> Self {
        let reason = format!("HTTP {}", status.as_u16());
        if status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
        {
            Self::transient(url, reason)
        } else {
            Self::fatal(url, reason)
        }
    }

    /// Classifies a transport-level error
    fn from_reqwest(url: &Url, error: &reqwest::Error) -> Self {
        if error.is_builder() || error.is_redirect() {
            Self::fatal(url, error.to_string())
        } else if error.is_timeout() {
            Self::transient(url, "Request timeout")
        } else if error.is_connect() {
            Self::transient(url, "Connection failed")
        } else {
            Self::transient(url, error.to_string())
        }
    }
}

/// Source of page bodies for the crawler
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a URL once
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Production fetcher over reqwest
///
/// Holds one client per configured proxy (or a single direct client) and
/// hands them out round-robin. Each client keeps its own cookie store, so
/// cookies persist per proxy session across requests.
pub struct HttpFetcher {
    clients: Vec<Client>,
    next: AtomicUsize,
}

impl HttpFetcher {
    /// Builds the fetcher from the run configuration
    pub fn new(config: &Config) -> Result<Self, ScraperError> {
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);

        let clients = if config.proxy.urls.is_empty() {
            vec![build_http_client(&config.user_agent, timeout, None)?]
        } else {
            config
                .proxy
                .urls
                .iter()
                .map(|proxy| build_http_client(&config.user_agent, timeout, Some(proxy)))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self::from_clients(clients))
    }

    /// Wraps pre-built clients
    pub fn from_clients(clients: Vec<Client>) -> Self {
        Self {
            clients,
            next: AtomicUsize::new(0),
        }
    }

    fn next_client(&self) -> Option<&Client> {
        if self.clients.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        self.clients.get(index)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let client = self
            .next_client()
            .ok_or_else(|| FetchError::fatal(url, "No HTTP client configured"))?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(FetchError::from_status(url, status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transient(url, format!("Failed to read body: {}", e)))?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Whole-request timeout
/// * `proxy` - Optional proxy URL all traffic is routed through
///
/// # Example
///
/// ```no_run
/// use practicelink_scraper::config::UserAgentConfig;
/// use practicelink_scraper::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig::default();
/// let client = build_http_client(&config, Duration::from_secs(60), None).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
    proxy: Option<&str>,
) -> Result<Client, ScraperError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let mut builder = Client::builder()
        .user_agent(user_agent.header_value())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .cookie_store(true)
        .gzip(true)
        .brotli(true);

    if let Some(proxy_url) = proxy {
        let proxy = Proxy::all(proxy_url).map_err(|source| ScraperError::Proxy {
            proxy: proxy_url.to_string(),
            source,
        })?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

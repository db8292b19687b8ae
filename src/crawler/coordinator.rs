//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the scheduler from the input configuration
//! - Dispatching requests to a bounded pool of worker tasks
//! - Applying worker outcomes (new requests, records, retries) in order
//! - Handling shutdown signals
//! - Finalizing the output sink with a run summary
//!
//! Workers only fetch and parse. Every change to the crawl state happens in
//! the coordinator after a worker has returned, one outcome at a time.

use crate::config::{validate, Config};
use crate::crawler::fetcher::{FetchError, Fetcher, HttpFetcher};
use crate::crawler::links::find_job_links;
use crate::crawler::pagination::find_next_page;
use crate::crawler::scheduler::Scheduler;
use crate::extract::extract_job;
use crate::output::{create_sink, OutputSink, RunSummary};
use crate::record::{JobRecord, LinkRecord, OutputRecord};
use crate::state::{CrawlRequest, CrawlState, RequestKind};
use crate::url::seed_urls;
use crate::ScraperError;
use scraper::Html;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use url::Url;

/// Pages between progress reports
const PROGRESS_INTERVAL: u64 = 10;

/// What a worker learned from one request
#[derive(Debug)]
enum Outcome {
    /// A listing page: candidate job URLs and the next page, if any
    Listing {
        links: Vec<Url>,
        next_page: Option<Url>,
    },

    /// A job page turned into a record
    Detail(JobRecord),

    /// The fetch failed or the worker timed out
    Failed(FetchError),
}

/// Handle used to stop a running crawl
///
/// Triggering stops dispatch and aborts in-flight workers. Records already
/// handed to the sink are kept and the sink is still finalized.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn OutputSink>,
    scheduler: Scheduler,
    request_timeout: Duration,
    shutdown: Arc<watch::Sender<bool>>,
    list_pages: u64,
    detail_pages: u64,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Seeds are resolved from the input configuration and enqueued as
    /// first-page listing requests.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Source of page bodies
    /// * `sink` - Destination of emitted records
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScraperError)` - A configured start URL is invalid
    pub fn new(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self, ScraperError> {
        let seeds = seed_urls(&config.input)?;

        let state = CrawlState::new(
            config.input.results_wanted,
            config.input.max_pages,
            config.crawler.max_concurrency,
        );
        let mut scheduler = Scheduler::new(state, config.crawler.max_retries);
        let seeded = scheduler.seed(seeds);
        tracing::info!("Seeded {} start URL(s)", seeded);

        let (sender, _) = watch::channel(false);

        Ok(Self {
            request_timeout: Duration::from_secs(config.crawler.request_timeout_secs.max(1)),
            config: Arc::new(config),
            fetcher,
            sink,
            scheduler,
            shutdown: Arc::new(sender),
            list_pages: 0,
            detail_pages: 0,
        })
    }

    /// Returns a handle that stops this crawl when triggered
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            sender: Arc::clone(&self.shutdown),
        }
    }

    /// Gets the scheduler driving this crawl
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs the main crawl loop
    ///
    /// This is the core crawling logic that:
    /// 1. Dispatches queued requests while fewer than the concurrency limit
    ///    are in flight
    /// 2. Waits for the next worker (or a shutdown signal)
    /// 3. Applies the worker's outcome to the scheduler and the sink
    /// 4. Stops when nothing is queued or in flight, or the result budget
    ///    is reached
    /// 5. Finalizes the sink with a [`RunSummary`]
    pub async fn run(&mut self) -> Result<RunSummary, ScraperError> {
        let start_time = Instant::now();
        let limit = self.scheduler.state().concurrency_limit;
        let mut workers: JoinSet<(CrawlRequest, Outcome)> = JoinSet::new();
        let mut shutdown = self.shutdown.subscribe();
        let mut interrupted = false;
        let mut last_report = 0;

        tracing::info!(
            "Starting crawl: budget {:?}, max {} pages per listing, {} workers",
            self.scheduler.state().result_budget,
            self.scheduler.state().page_budget,
            limit
        );

        loop {
            if *shutdown.borrow_and_update() {
                interrupted = true;
                break;
            }

            while workers.len() < limit {
                let Some(request) = self.scheduler.next_request()? else {
                    break;
                };
                tracing::debug!(
                    "Dispatching {} {} (attempt {})",
                    request.kind.label(),
                    request.url,
                    request.retry_count + 1
                );
                self.spawn_worker(&mut workers, request);
            }

            if workers.is_empty() {
                break;
            }

            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(Ok((request, outcome))) => self.apply_outcome(request, outcome)?,
                    Some(Err(e)) => {
                        tracing::error!("Worker task failed, request lost: {}", e);
                        self.scheduler.record_lost();
                    }
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        interrupted = true;
                        break;
                    }
                }
            }

            if self.scheduler.state().budget_exhausted() {
                tracing::info!("Result budget reached");
                break;
            }

            let processed = self.list_pages + self.detail_pages;
            if processed >= last_report + PROGRESS_INTERVAL {
                last_report = processed;
                let rate = processed as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} pages processed, {} saved, {} queued, {:.2} pages/sec",
                    processed,
                    self.scheduler.state().saved_count,
                    self.scheduler.queue_size(),
                    rate
                );
            }
        }

        if !workers.is_empty() {
            tracing::debug!("Aborting {} in-flight request(s)", workers.len());
        }
        workers.abort_all();
        while workers.join_next().await.is_some() {}

        if interrupted {
            tracing::warn!("Crawl interrupted by shutdown signal");
        }

        let stats = self.scheduler.stats();
        let summary = RunSummary {
            saved: self.scheduler.state().saved_count,
            list_pages: self.list_pages,
            detail_pages: self.detail_pages,
            failed: stats.dropped,
            retries: stats.retried,
            duplicates_skipped: stats.duplicates_skipped,
            interrupted,
            elapsed: start_time.elapsed(),
        };

        self.sink.finalize(&summary)?;
        tracing::info!(
            "Finished. Saved {} items ({} listing pages, {} job pages, {} failed) in {:?}",
            summary.saved,
            summary.list_pages,
            summary.detail_pages,
            summary.failed,
            summary.elapsed
        );

        Ok(summary)
    }

    fn spawn_worker(&self, workers: &mut JoinSet<(CrawlRequest, Outcome)>, request: CrawlRequest) {
        let fetcher = Arc::clone(&self.fetcher);
        let specialty = self.config.input.specialty.clone();
        let timeout = self.request_timeout;

        workers.spawn(async move {
            let work = process_request(fetcher, request.clone(), specialty);
            let outcome = match tokio::time::timeout(timeout, work).await {
                Ok(outcome) => outcome,
                Err(_) => Outcome::Failed(FetchError::transient(
                    &request.url,
                    format!("timed out after {:?}", timeout),
                )),
            };
            (request, outcome)
        });
    }

    /// Applies a worker outcome to the crawl state
    fn apply_outcome(&mut self, mut request: CrawlRequest, outcome: Outcome) -> Result<(), ScraperError> {
        match outcome {
            Outcome::Listing { links, next_page } => {
                self.scheduler.settle_success(&mut request)?;
                self.list_pages += 1;
                self.apply_listing(&request, links);

                if let Some(next) = next_page {
                    if self.scheduler.enqueue_next_page(&request, next.clone()) {
                        tracing::debug!("Queued page {}: {}", request.page_depth + 1, next);
                    }
                }
            }
            Outcome::Detail(job) => {
                self.scheduler.settle_success(&mut request)?;
                self.detail_pages += 1;
                if self.emit(job.into()) {
                    tracing::debug!("Saved {}", request.url);
                }
            }
            Outcome::Failed(error) => {
                let url = request.url.clone();
                let attempts = request.retry_count + 1;
                let kind = request.kind;
                let state = self.scheduler.settle_failure(request, error.is_transient())?;
                if state.is_terminal() {
                    tracing::warn!(
                        "Dropping {} {} after {} attempt(s): {}",
                        kind.label(),
                        url,
                        attempts,
                        error
                    );
                } else {
                    tracing::info!("Retrying {} {} after: {}", kind.label(), url, error);
                }
            }
        }

        Ok(())
    }

    fn apply_listing(&mut self, request: &CrawlRequest, links: Vec<Url>) {
        let found = links.len();

        if self.config.input.collect_details {
            let added = self.scheduler.enqueue_details(links);
            tracing::info!(
                "Page {} ({}): {} job links, {} new",
                request.page_depth,
                request.url,
                found,
                added
            );
            return;
        }

        let claimed = self.scheduler.claim_links(links);
        let mut emitted = 0;
        for url in claimed {
            if self.emit(LinkRecord::new(url.as_str()).into()) {
                emitted += 1;
            }
        }
        tracing::info!(
            "Page {} ({}): {} job links, {} saved",
            request.page_depth,
            request.url,
            found,
            emitted
        );
    }

    /// Hands a record to the sink if the result budget allows it
    ///
    /// Returns true if the record was written. A record the sink rejects
    /// does not count against the budget.
    fn emit(&mut self, record: OutputRecord) -> bool {
        if !self.scheduler.state_mut().try_record_saved() {
            tracing::debug!("Result budget reached, discarding {}", record.url());
            return false;
        }

        match self.sink.append(&record) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to write record for {}: {}", record.url(), e);
                self.scheduler.state_mut().release_saved();
                false
            }
        }
    }
}

/// Fetches one request and turns the page into an outcome
async fn process_request(
    fetcher: Arc<dyn Fetcher>,
    request: CrawlRequest,
    specialty: Option<String>,
) -> Outcome {
    match fetcher.fetch(&request.url).await {
        Ok(page) => parse_page(&request, &page.url, &page.body, specialty.as_deref()),
        Err(error) => Outcome::Failed(error),
    }
}

/// Parses a fetched body according to the request kind
///
/// Kept synchronous: the parsed document must not live across an await.
fn parse_page(request: &CrawlRequest, final_url: &Url, body: &str, specialty: Option<&str>) -> Outcome {
    let document = Html::parse_document(body);

    match request.kind {
        RequestKind::List => Outcome::Listing {
            links: find_job_links(&document, final_url),
            next_page: find_next_page(&document, final_url, request.page_depth),
        },
        RequestKind::Detail => Outcome::Detail(extract_job(&document, &request.url, specialty)),
    }
}

/// Runs the main crawl operation
///
/// This function wires the production collaborators together:
///
/// 1. Build the HTTP fetcher (one session per configured proxy)
/// 2. Open the configured output sink
/// 3. Seed the scheduler
/// 4. Crawl until the queue drains, the result budget is reached or Ctrl-C
///    is pressed
/// 5. Finalize the sink and return the run summary
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Identifies the configuration in the SQLite run table
///
/// # Returns
///
/// * `Ok(RunSummary)` - Crawl finished
/// * `Err(ScraperError)` - Setup failed or the sink could not be finalized
///
/// # Example
///
/// ```no_run
/// use practicelink_scraper::config::load_config_with_hash;
/// use practicelink_scraper::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("scraper.toml"))?;
/// let summary = run_crawl(config, &hash).await?;
/// println!("Saved {} records", summary.saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: &str) -> Result<RunSummary, ScraperError> {
    validate(&config)?;
    if !config.proxy.urls.is_empty() {
        tracing::info!("Rotating across {} proxies", config.proxy.urls.len());
    }

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config)?);
    let sink = create_sink(&config.output, config_hash)?;
    let mut coordinator = Coordinator::new(config, fetcher, sink)?;

    let shutdown = coordinator.shutdown_signal();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            shutdown.trigger();
        }
    });

    let result = coordinator.run().await;
    interrupt.abort();
    result
}

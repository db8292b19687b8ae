//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end: listing pages, pagination, job pages, retries
//! and budgets.

use practicelink_scraper::config::{Config, OutputConfig, OutputFormat};
use practicelink_scraper::crawler::{Coordinator, Fetcher, HttpFetcher};
use practicelink_scraper::output::{create_sink, MemorySink, RunSummary};
use practicelink_scraper::OutputRecord;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/jobboard/jobsearchresults";

/// Creates a test configuration starting from the first listing page
fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.input.start_urls = vec![listing_url(server, 1)];
    config.input.results_wanted = None;
    config.crawler.max_concurrency = 4;
    config.crawler.max_retries = 2;
    config.crawler.request_timeout_secs = 5;
    config
}

fn listing_url(server: &MockServer, page: u32) -> String {
    format!("{}{}/{}", server.uri(), LISTING_PATH, page)
}

fn job_path(id: u32) -> String {
    format!("/jobs/{}/urology/physician/co/acme-health/", id)
}

/// Listing page body linking to the given jobs and, optionally, a next page
fn listing_body(ids: &[u32], next_page: Option<u32>) -> String {
    let mut body = String::from("<html><body><ul class=\"results\">");
    for id in ids {
        body.push_str(&format!(
            r#"<li><a href="{}">Urologist opening {}</a></li>"#,
            job_path(*id),
            id
        ));
    }
    body.push_str("</ul>");
    body.push_str(r#"<a href="/about">About us</a>"#);
    if let Some(next) = next_page {
        body.push_str(&format!(
            r#"<a rel="next" href="{}/{}">Next</a>"#,
            LISTING_PATH, next
        ));
    }
    body.push_str("</body></html>");
    body
}

fn job_body(title: &str) -> String {
    format!(
        r#"<html><head><title>{title} Job at Acme Health | PracticeLink</title></head>
        <body><h1>{title} Job at Acme Health in Denver</h1>
        <div class="job-description"><p>Join our team.</p></div></body></html>"#
    )
}

fn structured_job_body(title: &str, company: &str) -> String {
    format!(
        r#"<html><head><script type="application/ld+json">
        {{"@context": "https://schema.org", "@type": "JobPosting",
          "title": "{title}",
          "hiringOrganization": {{"@type": "Organization", "name": "{company}"}},
          "datePosted": "2024-03-01",
          "description": "<p>Full-time <b>position</b></p>"}}
        </script></head><body><h1>Something else</h1></body></html>"#
    )
}

async fn mount_listing(server: &MockServer, page: u32, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", LISTING_PATH, page)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_job(server: &MockServer, id: u32, response: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path(job_path(id)))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

fn ok_html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

/// Runs a crawl against the mock server, collecting records in memory
async fn run_crawl(config: Config) -> (RunSummary, Arc<MemorySink>) {
    let fetcher: Arc<dyn Fetcher> =
        Arc::new(HttpFetcher::new(&config).expect("Failed to build fetcher"));
    let sink = Arc::new(MemorySink::new());
    let mut coordinator =
        Coordinator::new(config, fetcher, sink.clone()).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");
    (summary, sink)
}

fn job_titles(sink: &MemorySink) -> Vec<String> {
    let mut titles: Vec<String> = sink
        .records()
        .into_iter()
        .filter_map(|record| match record {
            OutputRecord::Job(job) => job.title,
            OutputRecord::Link(_) => None,
        })
        .collect();
    titles.sort();
    titles
}

#[tokio::test]
async fn test_full_crawl_across_pages() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, listing_body(&[1, 2], Some(2)), 1).await;
    mount_listing(&server, 2, listing_body(&[3], None), 1).await;
    mount_job(&server, 1, ok_html(structured_job_body("Hospitalist", "Acme Health")), 1).await;
    mount_job(&server, 2, ok_html(job_body("Urologist")), 1).await;
    mount_job(&server, 3, ok_html(job_body("Neurologist")), 1).await;

    let (summary, sink) = run_crawl(create_test_config(&server)).await;

    assert_eq!(summary.saved, 3);
    assert_eq!(summary.list_pages, 2);
    assert_eq!(summary.detail_pages, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(job_titles(&sink), vec!["Hospitalist", "Neurologist", "Urologist"]);

    let structured = sink
        .records()
        .into_iter()
        .find_map(|record| match record {
            OutputRecord::Job(job) if job.url.ends_with(&job_path(1)) => Some(job),
            _ => None,
        })
        .expect("Structured job missing");
    assert_eq!(structured.company.as_deref(), Some("Acme Health"));
    assert_eq!(structured.date_posted.as_deref(), Some("2024-03-01"));
    assert_eq!(structured.description_text.as_deref(), Some("Full-time position"));
    assert_eq!(structured.specialty.as_deref(), Some("urology"));
}

#[tokio::test]
async fn test_result_budget_limits_job_fetches() {
    let server = MockServer::start().await;
    let ids: Vec<u32> = (1..=20).collect();

    mount_listing(&server, 1, listing_body(&ids, Some(2)), 1).await;
    mount_listing(&server, 2, listing_body(&[21, 22], None), 0).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/jobs/\d+/"))
        .respond_with(ok_html(job_body("Urologist")))
        .expect(5)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.input.results_wanted = Some(5);
    // One worker: page 2 is queued behind the five jobs and never dispatched
    config.crawler.max_concurrency = 1;

    let (summary, sink) = run_crawl(config).await;

    assert_eq!(summary.saved, 5);
    assert_eq!(sink.len(), 5);
}

#[tokio::test]
async fn test_max_pages_stops_pagination() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, listing_body(&[1], Some(2)), 1).await;
    mount_listing(&server, 2, listing_body(&[2], Some(3)), 1).await;
    mount_listing(&server, 3, listing_body(&[3], Some(4)), 0).await;

    let mut config = create_test_config(&server);
    config.input.max_pages = 2;
    config.input.collect_details = false;

    let (summary, sink) = run_crawl(config).await;

    assert_eq!(summary.list_pages, 2);
    assert_eq!(sink.len(), 2);
}

#[tokio::test]
async fn test_transient_errors_are_retried_then_dropped() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, listing_body(&[1, 2], None), 1).await;
    mount_job(&server, 1, ok_html(job_body("Urologist")), 1).await;
    // max_retries = 2 allows three attempts in total
    mount_job(&server, 2, ResponseTemplate::new(503), 3).await;

    let (summary, sink) = run_crawl(create_test_config(&server)).await;

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.retries, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(job_titles(&sink), vec!["Urologist"]);
}

#[tokio::test]
async fn test_transient_error_recovers_on_retry() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, listing_body(&[1], None), 1).await;
    Mock::given(method("GET"))
        .and(path(job_path(1)))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_job(&server, 1, ok_html(job_body("Urologist")), 1).await;

    let (summary, sink) = run_crawl(create_test_config(&server)).await;

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.retries, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, listing_body(&[1, 2], None), 1).await;
    mount_job(&server, 1, ok_html(job_body("Urologist")), 1).await;
    mount_job(&server, 2, ResponseTemplate::new(404), 1).await;

    let (summary, sink) = run_crawl(create_test_config(&server)).await;

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.retries, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_slow_job_page_times_out_and_is_dropped() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, listing_body(&[1, 2], None), 1).await;
    mount_job(&server, 1, ok_html(job_body("Urologist")), 1).await;
    Mock::given(method("GET"))
        .and(path(job_path(2)))
        .respond_with(ok_html(job_body("Cardiologist")).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.crawler.request_timeout_secs = 1;
    config.crawler.max_retries = 1;

    let (summary, sink) = run_crawl(config).await;

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.retries, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(job_titles(&sink), vec!["Urologist"]);
}

#[tokio::test]
async fn test_duplicate_jobs_across_pages_fetched_once() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, listing_body(&[1, 2], Some(2)), 1).await;
    mount_listing(&server, 2, listing_body(&[2, 3, 1], None), 1).await;
    mount_job(&server, 1, ok_html(job_body("Urologist")), 1).await;
    mount_job(&server, 2, ok_html(job_body("Hospitalist")), 1).await;
    mount_job(&server, 3, ok_html(job_body("Neurologist")), 1).await;

    let (summary, sink) = run_crawl(create_test_config(&server)).await;

    assert_eq!(summary.saved, 3);
    assert_eq!(summary.duplicates_skipped, 2);
    assert_eq!(sink.len(), 3);
}

#[tokio::test]
async fn test_pagination_loop_terminates() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, listing_body(&[1], Some(2)), 1).await;
    mount_listing(&server, 2, listing_body(&[2], Some(1)), 1).await;

    let mut config = create_test_config(&server);
    config.input.collect_details = false;

    let (summary, sink) = run_crawl(config).await;

    assert_eq!(summary.list_pages, 2);
    assert_eq!(sink.len(), 2);
}

#[tokio::test]
async fn test_links_only_mode_emits_link_records() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, listing_body(&[1, 2, 3], None), 1).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/jobs/\d+/"))
        .respond_with(ok_html(job_body("Urologist")))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.input.collect_details = false;
    config.input.results_wanted = Some(2);

    let (summary, sink) = run_crawl(config).await;

    assert_eq!(summary.saved, 2);
    let records = sink.records();
    assert_eq!(records.len(), 2);
    for record in &records {
        match record {
            OutputRecord::Link(link) => {
                let value = serde_json::to_value(link).unwrap();
                assert_eq!(value["_source"], "practicelink.com");
                assert!(link.url.contains("/jobs/"));
            }
            OutputRecord::Job(job) => panic!("Unexpected job record for {}", job.url),
        }
    }
}

#[tokio::test]
async fn test_crawl_writes_json_lines_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("jobs.jsonl");

    mount_listing(&server, 1, listing_body(&[1, 2], None), 1).await;
    mount_job(&server, 1, ok_html(job_body("Urologist")), 1).await;
    mount_job(&server, 2, ok_html(job_body("Hospitalist")), 1).await;

    let mut config = create_test_config(&server);
    config.output = OutputConfig {
        format: OutputFormat::Jsonl,
        path: output_path.to_string_lossy().into_owned(),
    };

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config).unwrap());
    let sink = create_sink(&config.output, "test").unwrap();
    let mut coordinator = Coordinator::new(config, fetcher, sink).unwrap();
    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.saved, 2);

    let content = std::fs::read_to_string(&output_path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert!(line["url"].as_str().unwrap().contains("/jobs/"));
        assert!(line.get("salary").is_some());
        assert!(line["salary"].is_null());
    }
}

#[tokio::test]
async fn test_crawl_records_sqlite_run() {
    use practicelink_scraper::storage::{RunStatus, SqliteStorage, Storage};

    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("jobs.db");

    mount_listing(&server, 1, listing_body(&[1], None), 1).await;
    mount_job(&server, 1, ok_html(job_body("Urologist")), 1).await;

    let mut config = create_test_config(&server);
    config.output = OutputConfig {
        format: OutputFormat::Sqlite,
        path: db_path.to_string_lossy().into_owned(),
    };

    let summary = practicelink_scraper::run_crawl(config, "abc").await.unwrap();
    assert_eq!(summary.saved, 1);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_jobs().unwrap(), 1);
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.saved_count, 1);
    assert_eq!(run.config_hash, "abc");
}

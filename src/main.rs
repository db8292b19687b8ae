//! PracticeLink scraper main entry point
//!
//! This is the command-line interface for the PracticeLink job crawler.

use anyhow::{bail, Context};
use clap::Parser;
use practicelink_scraper::config::{hash_content, load_config_with_hash, validate, Config, OutputFormat};
use practicelink_scraper::crawler::run_crawl;
use practicelink_scraper::output::{load_statistics, print_statistics};
use practicelink_scraper::storage::open_storage;
use practicelink_scraper::url::seed_urls;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// PracticeLink scraper: a budgeted job-listing crawler
///
/// Crawls PracticeLink search results, follows job links across result
/// pages and writes one record per job, stopping once the requested number
/// of results has been saved.
#[derive(Parser, Debug)]
#[command(name = "practicelink-scraper")]
#[command(version)]
#[command(about = "A budgeted PracticeLink job crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply without one)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the SQLite output database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Specialty search filter
    #[arg(long)]
    specialty: Option<String>,

    /// State search filter
    #[arg(long)]
    state: Option<String>,

    /// City search filter
    #[arg(long)]
    city: Option<String>,

    /// Job type search filter
    #[arg(long)]
    job_type: Option<String>,

    /// Maximum number of records to save
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    results_wanted: Option<u64>,

    /// Maximum number of listing pages per start URL
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: Option<u32>,

    /// Explicit start URL (repeatable); overrides the search filters
    #[arg(long = "start-url", value_name = "URL")]
    start_urls: Vec<String>,

    /// Save job links only, without fetching job pages
    #[arg(long)]
    no_details: bool,

    /// Output file path
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        let input = &mut config.input;
        if let Some(specialty) = &self.specialty {
            input.specialty = Some(specialty.clone());
        }
        if let Some(state) = &self.state {
            input.state = Some(state.clone());
        }
        if let Some(city) = &self.city {
            input.city = Some(city.clone());
        }
        if let Some(job_type) = &self.job_type {
            input.job_type = Some(job_type.clone());
        }
        if let Some(results_wanted) = self.results_wanted {
            input.results_wanted = Some(results_wanted);
        }
        if let Some(max_pages) = self.max_pages {
            input.max_pages = max_pages;
        }
        if !self.start_urls.is_empty() {
            input.start_urls = self.start_urls.clone();
            input.start_url = None;
            input.url = None;
        }
        if self.no_details {
            input.collect_details = false;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
    }

    fn has_overrides(&self) -> bool {
        self.specialty.is_some()
            || self.state.is_some()
            || self.city.is_some()
            || self.job_type.is_some()
            || self.results_wanted.is_some()
            || self.max_pages.is_some()
            || !self.start_urls.is_empty()
            || self.no_details
            || self.output.is_some()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, file_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), None)
        }
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    // A file hash only identifies the run when nothing was overridden
    let config_hash = match file_hash {
        Some(hash) if !cli.has_overrides() => hash,
        _ => hash_content(&format!("{:?}", config)),
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("practicelink_scraper=info,warn"),
            1 => EnvFilter::new("practicelink_scraper=debug,info"),
            2 => EnvFilter::new("practicelink_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== PracticeLink Scraper Dry Run ===\n");

    let input = &config.input;
    println!("Input:");
    println!("  Specialty: {}", input.specialty.as_deref().unwrap_or("-"));
    println!("  State: {}", input.state.as_deref().unwrap_or("-"));
    println!("  City: {}", input.city.as_deref().unwrap_or("-"));
    println!("  Job type: {}", input.job_type.as_deref().unwrap_or("-"));
    match input.results_wanted {
        Some(n) => println!("  Results wanted: {}", n),
        None => println!("  Results wanted: unbounded"),
    }
    println!("  Max pages: {}", input.max_pages);
    println!("  Collect details: {}", input.collect_details);

    println!("\nCrawler Configuration:");
    println!("  Max concurrency: {}", config.crawler.max_concurrency);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nProxies ({}):", config.proxy.urls.len());
    for proxy in &config.proxy.urls {
        println!("  - {}", proxy);
    }

    println!("\nOutput:");
    println!("  Format: {:?}", config.output.format);
    println!("  Path: {}", config.output.path);

    let seeds = seed_urls(input)?;
    println!("\nStart URLs ({}):", seeds.len());
    for seed in &seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    if config.output.format != OutputFormat::Sqlite {
        bail!("--stats needs a SQLite output (set [output] format = \"sqlite\")");
    }

    let path = Path::new(&config.output.path);
    if !path.exists() {
        bail!("Database not found: {}", path.display());
    }

    println!("Database: {}\n", path.display());

    let storage = open_storage(path)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Output: {:?} -> {}",
        config.output.format,
        config.output.path
    );

    match run_crawl(config, config_hash).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl {}: {} records from {} pages at {:.2} records/sec",
                summary.status().to_db_string(),
                summary.saved,
                summary.pages_processed(),
                summary.rate()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

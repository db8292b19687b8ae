//! Configuration module for the scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; an empty file crawls the default PracticeLink search.
//!
//! # Example
//!
//! ```no_run
//! use practicelink_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Result budget: {:?}", config.input.results_wanted);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, InputConfig, OutputConfig, OutputFormat, ProxyConfig,
    UserAgentConfig, DEFAULT_MAX_PAGES, DEFAULT_RESULTS_WANTED,
};

// Re-export parser functions
pub use parser::{hash_content, load_config, load_config_with_hash, parse_config};
pub use validation::validate;

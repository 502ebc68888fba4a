//! Configuration module
//!
//! This module handles loading, parsing, and validating crawl configuration,
//! either from a TOML file or assembled from command-line flags.
//!
//! # Example
//!
//! ```no_run
//! use scopecrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Max concurrency: {}", config.crawler.max_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CrawlConfig, CrawlerConfig, FetchConfig, OutputConfig, DEFAULT_MAX_CONCURRENCY};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;

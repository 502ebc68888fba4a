//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The crawl frontier and its URL lifecycle
//! - The bounded fetch dispatcher and the fetcher boundary
//! - HTML parsing and link extraction
//! - Overall crawl coordination

mod coordinator;
mod dispatcher;
mod extractor;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{crawl, crawl_with_fetcher, Coordinator, CrawlPhase, CrawlStatus};
pub use dispatcher::{DispatchPolicy, Dispatcher, FetchOutcome, FetchResult, SkipReason};
pub use extractor::LinkExtractor;
pub use fetcher::{
    build_http_client, Artifacts, CaptureOptions, FetchError, FetchedPage, HttpFetcher,
    PageFetcher,
};
pub use frontier::{Frontier, FrontierCounts, QueuedUrl};
pub use parser::{extract_title, parse_links};

//! Crawl report: the result a crawl returns

use crate::crawler::{CrawlStatus, FrontierCounts};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One URL whose fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub url: String,

    /// Short error category (`timeout`, `http`, `network`, ...)
    pub kind: String,

    pub error: String,
}

/// Outcome of a whole crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// How the crawl ended
    pub status: CrawlStatus,

    /// Every URL admitted to the frontier, in admission order
    pub discovered: Vec<String>,

    /// Partition sizes at termination
    pub counts: FrontierCounts,

    /// Failed fetches, in completion order
    pub failures: Vec<FailureRecord>,

    /// Saves that failed, as `path: error` lines
    pub persist_errors: Vec<String>,

    /// Malformed links dropped during extraction
    pub malformed_links: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Returns true if the crawl ran until the frontier was exhausted
    pub fn is_complete(&self) -> bool {
        self.status == CrawlStatus::Completed
    }

    /// Wall-clock duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Returns true if the URL was discovered
    pub fn contains(&self, url: &str) -> bool {
        self.discovered.iter().any(|discovered| discovered == url)
    }
}

/// Formats a one-screen summary of a crawl
pub fn format_summary(report: &CrawlReport) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Summary ===\n\n");
    out.push_str(&format!("Status: {}\n", report.status));
    out.push_str(&format!("Duration: {:.1}s\n", report.duration_seconds()));
    out.push_str(&format!("Discovered: {}\n", report.discovered.len()));
    out.push_str(&format!("  Fetched: {}\n", report.counts.fetched));
    out.push_str(&format!("  Failed: {}\n", report.counts.failed));
    out.push_str(&format!("  Skipped: {}\n", report.counts.skipped));
    if report.counts.pending > 0 {
        out.push_str(&format!("  Never fetched: {}\n", report.counts.pending));
    }
    if report.malformed_links > 0 {
        out.push_str(&format!("Malformed links dropped: {}\n", report.malformed_links));
    }

    if !report.failures.is_empty() {
        out.push_str(&format!("\nFailures ({}):\n", report.failures.len()));
        for failure in &report.failures {
            out.push_str(&format!("  - {} [{}] {}\n", failure.url, failure.kind, failure.error));
        }
    }

    if !report.persist_errors.is_empty() {
        out.push_str(&format!("\nSave errors ({}):\n", report.persist_errors.len()));
        for error in &report.persist_errors {
            out.push_str(&format!("  - {}\n", error));
        }
    }

    out
}

/// Prints the crawl summary to stderr
pub fn print_summary(report: &CrawlReport) {
    eprint!("{}", format_summary(report));
}

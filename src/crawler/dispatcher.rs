//! Fetch dispatcher: a bounded pool of concurrent fetches
//!
//! The dispatcher claims URLs from the frontier, runs up to
//! `max-concurrency` fetches at once on a `JoinSet`, and completes each URL
//! in the frontier as its fetch finishes. Every claimed URL reaches a Done
//! state: fetched, failed (error, timeout, panic, abort) or skipped.

use crate::config::CrawlConfig;
use crate::crawler::fetcher::{CaptureOptions, FetchError, FetchedPage, PageFetcher};
use crate::crawler::frontier::{Frontier, QueuedUrl};
use crate::state::PageState;
use crate::url::{dedup_key, truncate_for_display};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

/// Why a claimed URL was resolved without fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The path ends with a skipped extension
    Extension(String),

    /// The URL lies deeper than `max-depth`
    Depth { depth: u32, max_depth: u32 },

    /// `max-pages` fetches were already started
    PageLimit(usize),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extension(ext) => write!(f, "skipped extension {}", ext),
            Self::Depth { depth, max_depth } => {
                write!(f, "depth {} exceeds max depth {}", depth, max_depth)
            }
            Self::PageLimit(limit) => write!(f, "page limit of {} reached", limit),
        }
    }
}

/// What happened to one claimed URL
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success { page: FetchedPage },
    Failure { error: FetchError },
    Skipped { reason: SkipReason },
}

/// The result for one claimed URL
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL as claimed from the frontier
    pub url: Url,

    /// Link hops from the nearest start URL
    pub depth: u32,

    pub outcome: FetchOutcome,
}

impl FetchResult {
    /// Returns the terminal state this result moves its URL to
    pub fn page_state(&self) -> PageState {
        match self.outcome {
            FetchOutcome::Success { .. } => PageState::Fetched,
            FetchOutcome::Failure { .. } => PageState::Failed,
            FetchOutcome::Skipped { .. } => PageState::Skipped,
        }
    }

    fn failed(queued: QueuedUrl, error: FetchError) -> Self {
        Self {
            url: queued.url,
            depth: queued.depth,
            outcome: FetchOutcome::Failure { error },
        }
    }
}

/// Limits applied while dispatching
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub max_concurrency: usize,
    pub max_pages: Option<usize>,
    pub max_depth: Option<u32>,
    pub skip_extensions: Vec<String>,
    pub request_timeout: Duration,
    pub capture: CaptureOptions,
}

impl DispatchPolicy {
    /// Builds the policy from a validated configuration
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            max_concurrency: config.crawler.max_concurrency.max(1),
            max_pages: config.crawler.max_pages,
            max_depth: config.crawler.effective_max_depth(),
            skip_extensions: config
                .crawler
                .skip_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            request_timeout: config.fetch.request_timeout(),
            capture: CaptureOptions::from_output(&config.output),
        }
    }

    /// Returns why a claimed URL must not be fetched, if it must not
    ///
    /// # Arguments
    ///
    /// * `queued` - The claimed URL
    /// * `started` - Fetches started so far
    pub fn skip_reason(&self, queued: &QueuedUrl, started: usize) -> Option<SkipReason> {
        let path = queued.url.path().to_ascii_lowercase();
        if let Some(ext) = self.skip_extensions.iter().find(|ext| path.ends_with(ext.as_str())) {
            return Some(SkipReason::Extension(ext.clone()));
        }

        if let Some(max_depth) = self.max_depth {
            if queued.depth > max_depth {
                return Some(SkipReason::Depth {
                    depth: queued.depth,
                    max_depth,
                });
            }
        }

        match self.max_pages {
            Some(limit) if started >= limit => Some(SkipReason::PageLimit(limit)),
            _ => None,
        }
    }
}

/// Runs fetches concurrently and reports each as it completes
pub struct Dispatcher {
    fetcher: Arc<dyn PageFetcher>,
    policy: DispatchPolicy,
    tasks: JoinSet<FetchResult>,

    /// Claimed URLs whose fetch has not been reported yet
    in_flight: Vec<QueuedUrl>,

    /// Fetches started so far
    started: usize,
}

impl Dispatcher {
    pub fn new(fetcher: Arc<dyn PageFetcher>, policy: DispatchPolicy) -> Self {
        Self {
            fetcher,
            policy,
            tasks: JoinSet::new(),
            in_flight: Vec::new(),
            started: 0,
        }
    }

    /// Claims pending URLs until every fetch slot is busy
    ///
    /// URLs that must not be fetched are completed as skipped right away.
    ///
    /// # Returns
    ///
    /// The results of the URLs skipped during this call
    pub fn fill(&mut self, frontier: &mut Frontier) -> Vec<FetchResult> {
        let mut skipped = Vec::new();

        while self.in_flight.len() < self.policy.max_concurrency {
            let Some(queued) = frontier.claim(1).pop() else {
                break;
            };

            if let Some(reason) = self.policy.skip_reason(&queued, self.started) {
                tracing::debug!("Skipping {}: {}", queued.url, reason);
                frontier.complete(&queued.url, PageState::Skipped);
                skipped.push(FetchResult {
                    url: queued.url,
                    depth: queued.depth,
                    outcome: FetchOutcome::Skipped { reason },
                });
                continue;
            }

            self.spawn(queued);
        }

        skipped
    }

    fn spawn(&mut self, queued: QueuedUrl) {
        tracing::debug!(
            "Fetching {} (depth {}) with {}",
            truncate_for_display(queued.url.as_str()),
            queued.depth,
            self.fetcher.name()
        );

        let fetcher = Arc::clone(&self.fetcher);
        let capture = self.policy.capture;
        let request_timeout = self.policy.request_timeout;
        let url = queued.url.clone();
        let depth = queued.depth;

        self.started += 1;
        self.in_flight.push(queued);

        self.tasks.spawn(async move {
            let fetch = AssertUnwindSafe(fetcher.fetch(&url, capture)).catch_unwind();

            let outcome = match tokio::time::timeout(request_timeout, fetch).await {
                Ok(Ok(Ok(page))) => FetchOutcome::Success { page },
                Ok(Ok(Err(error))) => FetchOutcome::Failure { error },
                Ok(Err(panic)) => FetchOutcome::Failure {
                    error: FetchError::Panicked(panic_message(panic.as_ref())),
                },
                Err(_) => FetchOutcome::Failure {
                    error: FetchError::Timeout(request_timeout),
                },
            };

            FetchResult {
                url,
                depth,
                outcome,
            }
        });
    }

    /// Waits for the next fetch to finish and completes its URL
    ///
    /// # Returns
    ///
    /// `None` when nothing is in flight
    pub async fn next_completed(&mut self, frontier: &mut Frontier) -> Option<FetchResult> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(result) => {
                    self.release(&result.url);
                    frontier.complete(&result.url, result.page_state());
                    return Some(result);
                }
                // Fetch bodies catch their own panics; only aborts land here
                Err(e) => tracing::error!("Fetch task ended abnormally: {}", e),
            }
        }

        // A task that ended abnormally leaves its URL behind
        let orphan = self.in_flight.pop()?;
        tracing::warn!("No result for {}; recording it as failed", orphan.url);
        frontier.complete(&orphan.url, PageState::Failed);
        Some(FetchResult::failed(
            orphan,
            FetchError::Network("fetch task ended without a result".to_string()),
        ))
    }

    /// Cancels every outstanding fetch
    ///
    /// Fetches that already finished keep their result; the rest are
    /// completed as failed.
    pub async fn abort(&mut self, frontier: &mut Frontier) -> Vec<FetchResult> {
        self.tasks.abort_all();

        let mut results = Vec::new();
        while let Some(joined) = self.tasks.join_next().await {
            if let Ok(result) = joined {
                self.release(&result.url);
                frontier.complete(&result.url, result.page_state());
                results.push(result);
            }
        }

        for queued in std::mem::take(&mut self.in_flight) {
            tracing::warn!("Aborted fetch of {}", queued.url);
            frontier.complete(&queued.url, PageState::Failed);
            results.push(FetchResult::failed(queued, FetchError::Aborted));
        }

        results
    }

    /// Number of fetches currently running
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of fetches started so far
    pub fn started(&self) -> usize {
        self.started
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    fn release(&mut self, url: &Url) {
        let key = dedup_key(url);
        if let Some(index) = self.in_flight.iter().position(|q| dedup_key(&q.url) == key) {
            self.in_flight.swap_remove(index);
        }
    }
}

/// Extracts a printable message from a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

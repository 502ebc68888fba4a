//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates:
//! - Seeding the frontier from the start URLs
//! - Dispatching fetches and handling their results
//! - Link extraction and content persistence
//! - The overall timeout and its drain period
//! - Building the final report

use crate::config::{validate, CrawlConfig};
use crate::crawler::dispatcher::{DispatchPolicy, Dispatcher, FetchOutcome, FetchResult};
use crate::crawler::extractor::LinkExtractor;
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::frontier::Frontier;
use crate::output::{write_links_file, ContentPersister, CrawlReport, FailureRecord};
use crate::url::{truncate_for_display, Scope};
use crate::{ConfigError, CrawlError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Progress is logged every this many completed URLs
const PROGRESS_INTERVAL: usize = 10;

/// Lifecycle of one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Idle,
    Seeding,
    Running,
    Draining,
    Terminated,
}

impl CrawlPhase {
    /// Returns true if the crawl may move from `self` to `next`
    pub fn can_transition_to(self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Seeding)
                | (Self::Seeding, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Terminated)
        )
    }
}

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    /// The frontier was exhausted
    Completed,

    /// The overall timeout fired; the result is partial
    TimedOut,
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: CrawlConfig,
    phase: CrawlPhase,
    frontier: Frontier,
    dispatcher: Dispatcher,
    extractor: LinkExtractor,
    persister: ContentPersister,
    failures: Vec<FailureRecord>,
    persist_errors: Vec<String>,
    handled: usize,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - A validated crawl configuration
    /// * `fetcher` - The page fetcher every fetch goes through
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - The scope could not be built
    pub fn new(config: CrawlConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self, CrawlError> {
        let scope = Scope::new(config.crawler.scope_bases(), &config.crawler.exclude)?;
        let dispatcher = Dispatcher::new(fetcher, DispatchPolicy::from_config(&config));
        let persister = ContentPersister::new(&config.output);

        Ok(Self {
            phase: CrawlPhase::Idle,
            frontier: Frontier::new(scope),
            dispatcher,
            extractor: LinkExtractor::new(),
            persister,
            failures: Vec::new(),
            persist_errors: Vec::new(),
            handled: 0,
            config,
        })
    }

    /// Returns the current phase
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), CrawlError> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::debug!("Crawl phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Runs the crawl to completion or timeout
    ///
    /// Per-URL failures never end the crawl; they are recorded in the
    /// report. A timeout is a [`CrawlStatus`], not an error.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl ran (possibly timing out)
    /// * `Err(CrawlError)` - No start URL was in scope, or the output
    ///   directory could not be prepared
    pub async fn run(mut self) -> Result<CrawlReport, CrawlError> {
        let started_at = Utc::now();

        self.transition(CrawlPhase::Seeding)?;

        let admitted = self.frontier.seed(&self.config.crawler.start_urls);
        if admitted == 0 {
            return Err(ConfigError::Validation(
                "no start URL is inside the crawl scope".to_string(),
            )
            .into());
        }
        self.persister.prepare().await?;
        tracing::info!(
            "Seeded {} start URL(s); scope roots: {}",
            admitted,
            self.frontier
                .scope()
                .roots()
                .iter()
                .map(|root| format!("{}{}", root.host, root.path_prefix))
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.transition(CrawlPhase::Running)?;
        let deadline = self
            .config
            .crawler
            .crawl_timeout()
            .map(|timeout| Instant::now() + timeout);
        let status = self.run_loop(deadline).await;

        self.transition(CrawlPhase::Draining)?;
        if status == CrawlStatus::TimedOut {
            tracing::warn!(
                "Crawl timed out; waiting up to {:?} for {} in-flight fetch(es)",
                self.config.crawler.grace_period(),
                self.dispatcher.in_flight_len()
            );
            self.drain(self.config.crawler.grace_period()).await;
        }

        self.transition(CrawlPhase::Terminated)?;
        Ok(self.into_report(status, started_at))
    }

    async fn run_loop(&mut self, deadline: Option<Instant>) -> CrawlStatus {
        loop {
            for skipped in self.dispatcher.fill(&mut self.frontier) {
                self.handle(skipped).await;
            }

            if self.frontier.is_exhausted() {
                tracing::info!("Frontier is empty, crawl complete");
                return CrawlStatus::Completed;
            }

            let next = match deadline {
                Some(deadline) => {
                    tokio::select! {
                        result = self.dispatcher.next_completed(&mut self.frontier) => result,
                        _ = tokio::time::sleep_until(deadline) => return CrawlStatus::TimedOut,
                    }
                }
                None => self.dispatcher.next_completed(&mut self.frontier).await,
            };

            if let Some(result) = next {
                self.handle(result).await;
            }
        }
    }

    /// Lets in-flight fetches finish for up to `grace`, then aborts the rest
    async fn drain(&mut self, grace: Duration) {
        let grace_deadline = Instant::now() + grace;

        while self.dispatcher.in_flight_len() > 0 {
            let next = tokio::select! {
                result = self.dispatcher.next_completed(&mut self.frontier) => result,
                _ = tokio::time::sleep_until(grace_deadline) => break,
            };

            match next {
                Some(result) => self.handle(result).await,
                None => break,
            }
        }

        for result in self.dispatcher.abort(&mut self.frontier).await {
            self.handle(result).await;
        }
    }

    /// Extracts links from, persists, and records one result
    async fn handle(&mut self, result: FetchResult) {
        match &result.outcome {
            FetchOutcome::Success { page } => {
                self.extractor.extract(&mut self.frontier, &result);

                for error in self.persister.persist(&result.url, page).await {
                    self.persist_errors.push(error.to_string());
                }
                tracing::debug!("Fetched {}", truncate_for_display(result.url.as_str()));
            }
            FetchOutcome::Failure { error } => {
                tracing::warn!("Failed to fetch {}: {}", result.url, error);
                self.failures.push(FailureRecord {
                    url: result.url.to_string(),
                    kind: error.kind().to_string(),
                    error: error.to_string(),
                });
            }
            FetchOutcome::Skipped { reason } => {
                tracing::debug!("Skipped {}: {}", result.url, reason);
            }
        }

        self.handled += 1;
        if self.handled % PROGRESS_INTERVAL == 0 {
            let counts = self.frontier.counts();
            tracing::info!(
                "Progress: {} fetched, {} failed, {} pending, {} in flight",
                counts.fetched,
                counts.failed,
                counts.pending,
                counts.in_flight
            );
        }
    }

    fn into_report(self, status: CrawlStatus, started_at: DateTime<Utc>) -> CrawlReport {
        let counts = self.frontier.counts();
        let report = CrawlReport {
            status,
            discovered: self
                .frontier
                .discovered()
                .iter()
                .map(|url| url.to_string())
                .collect(),
            counts,
            failures: self.failures,
            persist_errors: self.persist_errors,
            malformed_links: self.extractor.malformed_count(),
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "Crawl {}: {} discovered, {} fetched, {} failed, {} skipped in {:.1}s",
            status,
            report.discovered.len(),
            counts.fetched,
            counts.failed,
            counts.skipped,
            report.duration_seconds()
        );

        report
    }
}

/// Runs a complete crawl with the built-in HTTP fetcher
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration
/// 2. Build the HTTP fetcher
/// 3. Seed the frontier and crawl until exhausted or timed out
/// 4. Write the links file, if configured
///
/// # Arguments
///
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished (completed or timed out)
/// * `Err(CrawlError)` - Configuration or startup failure
pub async fn crawl(config: CrawlConfig) -> Result<CrawlReport, CrawlError> {
    validate(&config)?;

    let fetcher = HttpFetcher::new(&config.fetch)?;
    if config.output.wants_artifacts() {
        tracing::warn!("The HTTP fetcher does not capture PDFs or screenshots; none will be saved");
    }

    run_validated(config, Arc::new(fetcher)).await
}

/// Runs a complete crawl with a caller-supplied fetcher
pub async fn crawl_with_fetcher(
    config: CrawlConfig,
    fetcher: Arc<dyn PageFetcher>,
) -> Result<CrawlReport, CrawlError> {
    validate(&config)?;
    run_validated(config, fetcher).await
}

async fn run_validated(
    config: CrawlConfig,
    fetcher: Arc<dyn PageFetcher>,
) -> Result<CrawlReport, CrawlError> {
    let links_file = config.output.links_file.clone();
    let report = Coordinator::new(config, fetcher)?.run().await?;

    if let Some(path) = links_file {
        write_links_file(&path, &report)?;
    }

    Ok(report)
}

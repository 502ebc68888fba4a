//! Page fetching
//!
//! This module defines the boundary between the crawl engine and whatever
//! actually loads pages:
//! - The `PageFetcher` trait every fetcher implements
//! - `FetchedPage`, the one atomic result a fetcher returns per URL
//! - `FetchError` classification
//! - `HttpFetcher`, the built-in plain-HTTP implementation

use crate::config::{FetchConfig, OutputConfig};
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops before a fetch fails
const MAX_REDIRECTS: usize = 10;

/// Connect timeout for the HTTP client
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Which artifacts the fetcher should capture alongside the HTML
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureOptions {
    pub pdf: bool,
    pub screenshot: bool,
}

impl CaptureOptions {
    /// Derives capture options from the output settings
    pub fn from_output(output: &OutputConfig) -> Self {
        if output.urls_only {
            return Self::default();
        }

        Self {
            pdf: output.save_pdf,
            screenshot: output.save_screenshot,
        }
    }

    pub fn any(&self) -> bool {
        self.pdf || self.screenshot
    }
}

/// Binary artifacts captured while rendering a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    /// Rendered PDF bytes
    pub pdf: Option<Vec<u8>>,

    /// Full-page PNG screenshot bytes
    pub screenshot: Option<Vec<u8>>,
}

/// Everything a fetcher produces for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL after redirects; relative links resolve against it
    pub final_url: Url,

    /// Page HTML
    pub html: String,

    /// Links the fetcher observed itself (e.g. from a rendered DOM).
    /// May be relative or malformed.
    pub links: Vec<String>,

    pub artifacts: Artifacts,
}

impl FetchedPage {
    /// Creates a page with HTML only
    pub fn new(final_url: Url, html: impl Into<String>) -> Self {
        Self {
            final_url,
            html: html.into(),
            links: Vec::new(),
            artifacts: Artifacts::default(),
        }
    }

    /// Adds fetcher-observed links
    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = links.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_artifacts(mut self, artifacts: Artifacts) -> Self {
        self.artifacts = artifacts;
        self
    }
}

/// Why a single fetch failed
///
/// Every variant is per-URL: the URL is recorded as failed and the crawl
/// continues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Expected HTML, got '{content_type}'")]
    ContentMismatch { content_type: String },

    #[error("Fetcher panicked: {0}")]
    Panicked(String),

    #[error("Fetcher unavailable: {0}")]
    Unavailable(String),

    #[error("Fetch aborted: crawl timed out")]
    Aborted,
}

impl FetchError {
    /// Returns a short stable label, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Http { .. } => "http",
            Self::Network(_) => "network",
            Self::ContentMismatch { .. } => "content_mismatch",
            Self::Panicked(_) => "panicked",
            Self::Unavailable(_) => "unavailable",
            Self::Aborted => "aborted",
        }
    }
}

/// Loads a page and reports its HTML, links and artifacts
///
/// Implementations may be slow, may fail, and may return malformed links;
/// the crawl engine tolerates all three. A fetcher that panics is treated as
/// a failed fetch.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one URL
    async fn fetch(&self, url: &Url, capture: CaptureOptions) -> Result<FetchedPage, FetchError>;

    /// Name used in log lines
    fn name(&self) -> &str {
        "fetcher"
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use scopecrawl::config::FetchConfig;
/// use scopecrawl::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetcher
///
/// Follows redirects, accepts only HTML responses, and never captures
/// artifacts: PDFs and screenshots need a rendering fetcher plugged in
/// through [`PageFetcher`].
pub struct HttpFetcher {
    client: Client,
    request_timeout: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the fetch configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Ready to fetch
    /// * `Err(CrawlError::FetcherUnavailable)` - The HTTP client could not be built
    pub fn new(config: &FetchConfig) -> Result<Self, CrawlError> {
        let client = build_http_client(config)
            .map_err(|e| CrawlError::FetcherUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            request_timeout: config.request_timeout(),
        })
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.request_timeout)
        } else if error.is_redirect() {
            FetchError::Network(format!("Redirect error: {}", error))
        } else if error.is_connect() {
            FetchError::Network(format!("Connection failed: {}", error))
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, capture: CaptureOptions) -> Result<FetchedPage, FetchError> {
        if capture.any() {
            tracing::trace!("HTTP fetcher cannot capture artifacts for {}", url);
        }

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return Err(FetchError::ContentMismatch { content_type });
        }

        let html = response.text().await.map_err(|e| self.classify(e))?;

        Ok(FetchedPage::new(final_url, html))
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Returns true for HTML and XHTML content types
fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime == "text/html" || mime == "application/xhtml+xml"
}

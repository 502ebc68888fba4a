use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default cap on simultaneous fetches, roughly one browser's worth of tabs
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Main configuration structure for a crawl
///
/// Every section is optional in TOML; command-line flags fill in or override
/// whatever the file leaves out before validation runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlConfig {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl CrawlConfig {
    /// Creates a configuration with defaults for everything but the start URLs
    pub fn new<I, S>(start_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        config.crawler.start_urls = start_urls.into_iter().map(Into::into).collect();
        config
    }
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// URLs the crawl starts from
    #[serde(rename = "start-urls")]
    pub start_urls: Vec<String>,

    /// Scope roots; each contributes a (host, path prefix) pair.
    /// Empty means "the start URLs".
    pub base: Vec<String>,

    /// Exclude patterns (path prefixes, URL prefixes, `*` wildcards)
    pub exclude: Vec<String>,

    /// Maximum number of concurrent fetches
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: usize,

    /// Maximum number of pages to fetch
    #[serde(rename = "max-pages")]
    pub max_pages: Option<usize>,

    /// Maximum link hops from a start URL
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,

    /// Only fetch the start URLs; their links are reported but not followed
    #[serde(rename = "initial-only")]
    pub initial_only: bool,

    /// Overall crawl timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: Option<u64>,

    /// How long in-flight fetches may keep running after the timeout fires
    #[serde(rename = "grace-period-secs")]
    pub grace_period_secs: u64,

    /// URL suffixes that are recorded as discovered but never fetched
    #[serde(rename = "skip-extensions")]
    pub skip_extensions: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_urls: Vec::new(),
            base: Vec::new(),
            exclude: Vec::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_pages: None,
            max_depth: None,
            initial_only: false,
            timeout_secs: None,
            grace_period_secs: 5,
            skip_extensions: vec![".zip".to_string(), ".pdf".to_string(), ".m3u8".to_string()],
        }
    }
}

impl CrawlerConfig {
    /// Returns the scope roots, falling back to the start URLs
    pub fn scope_bases(&self) -> &[String] {
        if self.base.is_empty() {
            &self.start_urls
        } else {
            &self.base
        }
    }

    /// Returns the depth cap, with `initial-only` meaning depth 0
    pub fn effective_max_depth(&self) -> Option<u32> {
        if self.initial_only {
            Some(0)
        } else {
            self.max_depth
        }
    }

    /// Returns the overall crawl timeout, if any
    pub fn crawl_timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

/// Page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-fetch timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("scopecrawl/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory for saved content
    pub dir: PathBuf,

    /// Save each page's raw HTML
    #[serde(rename = "save-html")]
    pub save_html: bool,

    /// Save each page converted to Markdown
    #[serde(rename = "save-markdown")]
    pub save_markdown: bool,

    /// Save the PDF artifact returned by the fetcher
    #[serde(rename = "save-pdf")]
    pub save_pdf: bool,

    /// Save the screenshot artifact returned by the fetcher
    #[serde(rename = "save-screenshot")]
    pub save_screenshot: bool,

    /// Only discover URLs; nothing is written under `dir`
    #[serde(rename = "urls-only")]
    pub urls_only: bool,

    /// JSON file that receives the discovered URL list
    #[serde(rename = "links-file")]
    pub links_file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
            save_html: false,
            save_markdown: false,
            save_pdf: false,
            save_screenshot: false,
            urls_only: false,
            links_file: None,
        }
    }
}

impl OutputConfig {
    /// Returns true if any per-page content will be written
    pub fn saves_content(&self) -> bool {
        !self.urls_only
            && (self.save_html || self.save_markdown || self.save_pdf || self.save_screenshot)
    }

    /// Returns true if the fetcher should capture PDF or screenshot artifacts
    pub fn wants_artifacts(&self) -> bool {
        !self.urls_only && (self.save_pdf || self.save_screenshot)
    }
}

//! scopecrawl main entry point
//!
//! This is the command-line interface for the scopecrawl same-host crawler.

use anyhow::Context;
use clap::Parser;
use scopecrawl::config::{compute_config_hash, parse_config, validate, CrawlConfig};
use scopecrawl::crawler::crawl;
use scopecrawl::output::print_summary;
use scopecrawl::url::Scope;
use scopecrawl::CrawlError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code for configuration errors
const EXIT_CONFIG: u8 = 2;

/// Exit code for startup failures
const EXIT_STARTUP: u8 = 1;

/// scopecrawl: crawl every page under a set of root URLs
///
/// Follows links breadth-first while staying on the start hosts and under
/// their path prefixes, optionally saving each page as HTML, Markdown, PDF
/// or screenshot, and reports every URL it discovered.
#[derive(Parser, Debug)]
#[command(name = "scopecrawl")]
#[command(version)]
#[command(about = "A same-host web crawler", long_about = None)]
struct Cli {
    /// Start URL (repeatable)
    #[arg(short = 'u', long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Scope root; defaults to the start URLs (repeatable)
    #[arg(short, long, value_name = "URL")]
    base: Vec<String>,

    /// Exclude patterns, comma-separated (repeatable)
    #[arg(short, long, value_name = "LIST", value_delimiter = ',')]
    exclude: Vec<String>,

    /// Only fetch the start URLs
    #[arg(long)]
    initial_only: bool,

    /// Save each page's HTML
    #[arg(long)]
    save_html: bool,

    /// Save each page as Markdown
    #[arg(long = "save-md")]
    save_markdown: bool,

    /// Save each page's PDF rendering (needs a rendering fetcher)
    #[arg(long)]
    save_pdf: bool,

    /// Save each page's screenshot (needs a rendering fetcher)
    #[arg(long)]
    save_screenshot: bool,

    /// Save nothing; print discovered URLs to stdout
    #[arg(long)]
    urls_only: bool,

    /// Root directory for saved content
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum simultaneous fetches
    #[arg(short = 'j', long, value_name = "N")]
    max_concurrency: Option<usize>,

    /// Maximum number of pages to fetch
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Maximum link hops from a start URL
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Overall crawl timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Seconds in-flight fetches may finish after the timeout
    #[arg(long, value_name = "SECS")]
    grace_period: Option<u64>,

    /// Per-fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    request_timeout: Option<u64>,

    /// User agent sent with every request
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Write the discovered URLs to this JSON file
    #[arg(long, value_name = "PATH")]
    links_file: Option<PathBuf>,

    /// Path to TOML configuration file; flags override it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Validate the configuration and show the crawl scope without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if cli.dry_run {
        return match handle_dry_run(&config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("Invalid configuration: {:#}", e);
                ExitCode::from(EXIT_CONFIG)
            }
        };
    }

    match handle_crawl(config, cli.quiet).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Crawl failed: {:#}", e);
            match e.downcast_ref::<CrawlError>() {
                Some(CrawlError::Config(_)) => ExitCode::from(EXIT_CONFIG),
                _ => ExitCode::from(EXIT_STARTUP),
            }
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that `--urls-only` output on stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scopecrawl=info,warn"),
            1 => EnvFilter::new("scopecrawl=debug,info"),
            2 => EnvFilter::new("scopecrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file, if any, applies flag overrides and validates
fn build_config(cli: &Cli) -> anyhow::Result<CrawlConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let config = parse_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let hash = compute_config_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => CrawlConfig::default(),
    };

    apply_overrides(&mut config, cli);
    validate(&config)?;

    Ok(config)
}

/// Command-line flags win over the config file
fn apply_overrides(config: &mut CrawlConfig, cli: &Cli) {
    let crawler = &mut config.crawler;
    if !cli.urls.is_empty() {
        crawler.start_urls = cli.urls.clone();
    }
    if !cli.base.is_empty() {
        crawler.base = cli.base.clone();
    }
    crawler.exclude.extend(
        cli.exclude
            .iter()
            .map(|pattern| pattern.trim().to_string())
            .filter(|pattern| !pattern.is_empty()),
    );
    crawler.initial_only |= cli.initial_only;
    if let Some(n) = cli.max_concurrency {
        crawler.max_concurrency = n;
    }
    if cli.max_pages.is_some() {
        crawler.max_pages = cli.max_pages;
    }
    if cli.max_depth.is_some() {
        crawler.max_depth = cli.max_depth;
    }
    if cli.timeout.is_some() {
        crawler.timeout_secs = cli.timeout;
    }
    if let Some(secs) = cli.grace_period {
        crawler.grace_period_secs = secs;
    }

    let fetch = &mut config.fetch;
    if let Some(secs) = cli.request_timeout {
        fetch.request_timeout_secs = secs;
    }
    if let Some(user_agent) = &cli.user_agent {
        fetch.user_agent = user_agent.clone();
    }

    let output = &mut config.output;
    output.save_html |= cli.save_html;
    output.save_markdown |= cli.save_markdown;
    output.save_pdf |= cli.save_pdf;
    output.save_screenshot |= cli.save_screenshot;
    output.urls_only |= cli.urls_only;
    if let Some(dir) = &cli.output_dir {
        output.dir = dir.clone();
    }
    if cli.links_file.is_some() {
        output.links_file = cli.links_file.clone();
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &CrawlConfig) -> anyhow::Result<()> {
    let scope = Scope::new(config.crawler.scope_bases(), &config.crawler.exclude)?;

    println!("=== scopecrawl Dry Run ===\n");

    println!("Start URLs ({}):", config.crawler.start_urls.len());
    for url in &config.crawler.start_urls {
        println!("  - {}", url);
    }

    println!("\nScope roots:");
    for root in scope.roots() {
        println!("  - {}{}", root.host, root.path_prefix);
    }

    if !config.crawler.exclude.is_empty() {
        println!("\nExcluded ({}):", config.crawler.exclude.len());
        for pattern in &config.crawler.exclude {
            println!("  - {}", pattern);
        }
    }

    println!("\nCrawler:");
    println!("  Max concurrency: {}", config.crawler.max_concurrency);
    println!("  Max pages: {}", display_limit(config.crawler.max_pages));
    println!(
        "  Max depth: {}",
        display_limit(config.crawler.effective_max_depth())
    );
    println!("  Timeout: {}", display_limit(config.crawler.timeout_secs));

    println!("\nOutput:");
    if config.output.saves_content() {
        println!("  Directory: {}", config.output.dir.display());
        println!("  HTML: {}", config.output.save_html);
        println!("  Markdown: {}", config.output.save_markdown);
        println!("  PDF: {}", config.output.save_pdf);
        println!("  Screenshot: {}", config.output.save_screenshot);
    } else {
        println!("  Nothing is saved");
    }
    if let Some(path) = &config.output.links_file {
        println!("  Links file: {}", path.display());
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

fn display_limit<T: std::fmt::Display>(limit: Option<T>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |value| value.to_string())
}

/// Handles the main crawl operation
async fn handle_crawl(config: CrawlConfig, quiet: bool) -> anyhow::Result<()> {
    let urls_only = config.output.urls_only;

    tracing::info!(
        "Starting crawl of {} start URL(s) with {} worker(s)",
        config.crawler.start_urls.len(),
        config.crawler.max_concurrency
    );

    let report = crawl(config).await?;

    if urls_only {
        for url in &report.discovered {
            println!("{}", url);
        }
    }

    if !quiet {
        print_summary(&report);
    }

    Ok(())
}

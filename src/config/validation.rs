use crate::config::types::{CrawlConfig, CrawlerConfig, FetchConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrent fetches
const MAX_CONCURRENCY_LIMIT: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates traversal configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.start_urls.is_empty() {
        return Err(ConfigError::Validation(
            "at least one start URL is required".to_string(),
        ));
    }

    for url in &config.start_urls {
        validate_crawl_url("start URL", url)?;
    }

    for url in &config.base {
        validate_crawl_url("base URL", url)?;
    }

    for pattern in &config.exclude {
        validate_exclude_pattern(pattern)?;
    }

    if config.max_concurrency < 1 || config.max_concurrency > MAX_CONCURRENCY_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY_LIMIT, config.max_concurrency
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    if config.timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    for ext in &config.skip_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "skip extension '{}' must look like '.zip'",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output dir cannot be empty".to_string(),
        ));
    }

    // Only matters when something will be written there
    if config.saves_content() && config.dir.exists() && !config.dir.is_dir() {
        return Err(ConfigError::Validation(format!(
            "output dir '{}' exists and is not a directory",
            config.dir.display()
        )));
    }

    if let Some(links_file) = &config.links_file {
        if links_file.as_os_str().is_empty() || links_file.is_dir() {
            return Err(ConfigError::Validation(format!(
                "links file '{}' must be a file path",
                links_file.display()
            )));
        }
    }

    if config.urls_only
        && (config.save_html || config.save_markdown || config.save_pdf || config.save_screenshot)
    {
        tracing::warn!("urls-only is set; save options will be ignored");
    }

    Ok(())
}

/// Validates a URL the crawl will start from or scope itself to
fn validate_crawl_url(label: &str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", label, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            label, raw
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            label, raw
        )));
    }

    Ok(())
}

/// Validates an exclude pattern
fn validate_exclude_pattern(pattern: &str) -> Result<(), ConfigError> {
    let trimmed = pattern.trim();

    if trimmed.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Exclude pattern cannot be empty".to_string(),
        ));
    }

    if trimmed.contains("://") {
        // Full URL prefix: the part before any wildcard must name a host
        let literal = trimmed.split('*').next().unwrap_or_default();
        let host = literal
            .split_once("://")
            .map(|(_, rest)| rest.split('/').next().unwrap_or_default())
            .unwrap_or_default();
        if host.is_empty() {
            return Err(ConfigError::InvalidPattern(format!(
                "Exclude pattern '{}' has no host",
                pattern
            )));
        }
    } else if !trimmed.starts_with('/') && !trimmed.starts_with('*') {
        return Err(ConfigError::InvalidPattern(format!(
            "Exclude pattern '{}' must start with '/', '*' or a scheme",
            pattern
        )));
    }

    Ok(())
}

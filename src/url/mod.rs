//! URL handling module
//!
//! This module provides URL normalization, exclude-pattern matching and the
//! crawl scope filter.

mod matcher;
mod normalize;
mod scope;

pub use matcher::matches_pattern;
pub use normalize::{dedup_key, normalize_url, normalize_with_base};
pub use scope::{Scope, ScopeRoot};

/// Maximum length of a URL in log lines before it is shortened
const DISPLAY_LIMIT: usize = 40;

/// Shortens long URLs for log lines as `first 20 chars...last 20 chars`
///
/// # Examples
///
/// ```
/// use scopecrawl::url::truncate_for_display;
///
/// assert_eq!(truncate_for_display("https://example.com/"), "https://example.com/");
///
/// let long = "https://example.com/a/very/long/path/that/keeps/going/on";
/// assert_eq!(truncate_for_display(long), "https://example.com/.../that/keeps/going/on");
/// ```
pub fn truncate_for_display(url: &str) -> String {
    let chars: Vec<char> = url.chars().collect();
    if chars.len() <= DISPLAY_LIMIT {
        return url.to_string();
    }

    let head: String = chars[..DISPLAY_LIMIT / 2].iter().collect();
    let tail: String = chars[chars.len() - DISPLAY_LIMIT / 2..].iter().collect();
    format!("{}...{}", head, tail)
}

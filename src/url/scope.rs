//! Crawl scope: which URLs the crawler may follow
//!
//! A scope is a list of roots, each a `(host, path prefix)` pair taken from a
//! base URL, plus a list of exclude patterns. Matching is purely structural;
//! the scheme is ignored so that http and https variants of a page share the
//! same verdict.

use crate::url::matcher::matches_pattern;
use crate::url::normalize::normalize_url;
use crate::ConfigError;
use url::{Position, Url};

/// One allowed `(host, path prefix)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRoot {
    /// Lowercase host, with `:port` when the port is not the scheme default
    pub host: String,

    /// Normalized path prefix, `/` for a whole host
    pub path_prefix: String,
}

impl ScopeRoot {
    fn from_base(base: &str) -> Result<Self, ConfigError> {
        let url = normalize_url(base)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base URL '{}': {}", base, e)))?;

        Ok(Self {
            host: host_key(&url),
            path_prefix: trim_trailing_slash(url.path()).to_string(),
        })
    }

    /// Returns true if the URL's host and path fall under this root
    ///
    /// The prefix must end at a segment boundary: `/docs` covers `/docs` and
    /// `/docs/intro` but not `/docsearch`.
    pub fn contains(&self, url: &Url) -> bool {
        if host_key(url) != self.host {
            return false;
        }

        let path = url.path();
        if self.path_prefix == "/" || path == self.path_prefix {
            return true;
        }

        path.strip_prefix(self.path_prefix.as_str())
            .map_or(false, |rest| rest.starts_with('/'))
    }
}

/// A compiled exclude pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExcludePattern {
    /// Matched against `path?query`
    Path(String),

    /// Matched against `host/path?query`; the scheme was stripped
    Url(String),
}

impl ExcludePattern {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let pattern = raw.trim();
        if pattern.is_empty() {
            return Err(ConfigError::InvalidPattern(
                "Exclude pattern cannot be empty".to_string(),
            ));
        }

        match pattern.split_once("://") {
            Some((scheme, rest)) => {
                let (host, path) = match rest.find('/') {
                    Some(index) => rest.split_at(index),
                    None => (rest, ""),
                };
                let host = strip_default_port(&scheme.to_lowercase(), &host.to_lowercase());
                Ok(Self::Url(format!("{}{}", host, normalize_pattern_path(path))))
            }
            None => Ok(Self::Path(normalize_pattern_path(pattern))),
        }
    }

    fn matches(&self, url: &Url) -> bool {
        match self {
            Self::Path(pattern) => {
                matches_pattern(pattern, &url[Position::BeforePath..Position::AfterQuery])
            }
            Self::Url(pattern) => {
                matches_pattern(pattern, &url[Position::BeforeHost..Position::AfterQuery])
            }
        }
    }
}

/// The set of URLs a crawl is permitted to follow
#[derive(Debug, Clone)]
pub struct Scope {
    roots: Vec<ScopeRoot>,
    excludes: Vec<ExcludePattern>,
}

impl Scope {
    /// Builds a scope from base URLs and exclude patterns
    ///
    /// # Arguments
    ///
    /// * `bases` - Base URLs; each contributes a `(host, path prefix)` root
    /// * `excludes` - Exclude patterns (path prefixes, URL prefixes, `*` wildcards)
    ///
    /// # Returns
    ///
    /// * `Ok(Scope)` - Compiled scope
    /// * `Err(ConfigError)` - A base URL or pattern is invalid
    ///
    /// # Example
    ///
    /// ```
    /// use scopecrawl::url::Scope;
    /// use url::Url;
    ///
    /// let scope = Scope::new(&["https://example.com/docs"], &["/docs/private"]).unwrap();
    ///
    /// assert!(scope.is_in_scope(&Url::parse("https://example.com/docs/intro").unwrap()));
    /// assert!(!scope.is_in_scope(&Url::parse("https://example.com/blog").unwrap()));
    /// assert!(!scope.is_in_scope(&Url::parse("https://example.com/docs/private/x").unwrap()));
    /// ```
    pub fn new<B, E>(bases: &[B], excludes: &[E]) -> Result<Self, ConfigError>
    where
        B: AsRef<str>,
        E: AsRef<str>,
    {
        if bases.is_empty() {
            return Err(ConfigError::Validation(
                "scope needs at least one base URL".to_string(),
            ));
        }

        let mut roots: Vec<ScopeRoot> = Vec::with_capacity(bases.len());
        for base in bases {
            let root = ScopeRoot::from_base(base.as_ref())?;
            if !roots.contains(&root) {
                roots.push(root);
            }
        }

        let excludes = excludes
            .iter()
            .map(|pattern| ExcludePattern::parse(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { roots, excludes })
    }

    /// Returns true iff the URL is under at least one root and matches no
    /// exclude pattern
    pub fn is_in_scope(&self, url: &Url) -> bool {
        let in_root = self.roots.iter().any(|root| root.contains(url));
        if !in_root {
            tracing::trace!("Out of scope: {}", url);
            return false;
        }

        if self.is_excluded(url) {
            tracing::trace!("Excluded: {}", url);
            return false;
        }

        true
    }

    /// Returns true if any exclude pattern matches the URL
    pub fn is_excluded(&self, url: &Url) -> bool {
        self.excludes.iter().any(|pattern| pattern.matches(url))
    }

    /// Returns the compiled roots
    pub fn roots(&self) -> &[ScopeRoot] {
        &self.roots
    }
}

/// Drops the trailing slash of a path other than `/`
fn trim_trailing_slash(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

/// Brings the path part of a pattern in line with normalized URL paths
///
/// Repeated slashes collapse and a trailing slash is dropped, so `/private/`
/// matches both `/private` and `/private/`. Any `?query` part is untouched.
fn normalize_pattern_path(pattern: &str) -> String {
    let (path, query) = match pattern.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (pattern, None),
    };

    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    let collapsed = trim_trailing_slash(&collapsed);

    match query {
        Some(query) => format!("{}?{}", collapsed, query),
        None => collapsed.to_string(),
    }
}

/// Removes `:80` from http and `:443` from https hosts, as URL parsing does
fn strip_default_port(scheme: &str, host: &str) -> String {
    match (scheme, host.rsplit_once(':')) {
        ("http", Some((name, "80"))) | ("https", Some((name, "443"))) => name.to_string(),
        _ => host.to_string(),
    }
}

/// Returns `host` or `host:port` for a URL
fn host_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}

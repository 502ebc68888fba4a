use crate::UrlError;
use url::{Position, Url};

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes an absolute URL according to the crawler's normalization rules
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Lowercase the host (default ports are already dropped by the parser)
/// 4. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Keep a trailing slash as written; it changes how relative links resolve
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking query parameters
/// 7. Sort remaining query parameters by key
/// 8. Remove empty query string (trailing ?)
///
/// The scheme and trailing slash are kept as written; http/https and
/// `/dir` vs `/dir/` unification happen in the frontier, which keys URLs by
/// [`dedup_key`].
///
/// # Examples
///
/// ```
/// use scopecrawl::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM:443/docs/../guide/#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/guide");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Resolves `raw` against the page it appeared on, then normalizes it
///
/// # Examples
///
/// ```
/// use scopecrawl::url::normalize_with_base;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/docs/intro").unwrap();
/// let url = normalize_with_base("../about/?b=2&a=1", &page).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about?a=1&b=2");
/// ```
pub fn normalize_with_base(raw: &str, base: &Url) -> Result<Url, UrlError> {
    let url = base
        .join(raw.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;
    normalize_parsed(url)
}

/// Returns the identity of a normalized URL for deduplication
///
/// The scheme and any trailing slash are ignored: `http://example.com/a`,
/// `https://example.com/a` and `https://example.com/a/` share a key.
pub fn dedup_key(url: &Url) -> String {
    let location = &url[Position::BeforeUsername..Position::AfterPath];
    let location = match location.strip_suffix('/') {
        Some(trimmed) if url.path() != "/" => trimmed,
        _ => location,
    };
    format!("{}{}", location, &url[Position::AfterPath..])
}

fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_lowercase(),
        _ => return Err(UrlError::MissingHost),
    };
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and repeated slashes
fn normalize_path(path: &str) -> String {
    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Empty segments come from repeated slashes
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    let mut normalized = format!("/{}", normalized_segments.join("/"));
    if path.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    // Stable sort keeps repeated keys in their original order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

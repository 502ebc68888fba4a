//! Deterministic, filesystem-safe file names for saved pages

use sha2::{Digest, Sha256};
use url::Url;

/// Maximum length of the readable part of a file name
const MAX_STEM_LEN: usize = 100;

/// Hex characters of the URL hash appended to every name
const HASH_LEN: usize = 12;

/// Builds the file name a page is saved under
///
/// The name is `host_path` with `/` replaced by `_` (`index` for the root
/// path), every character outside `[A-Za-z0-9._-]` replaced by `_`,
/// truncated, then suffixed with the first 12 hex characters of the SHA-256
/// of the full normalized URL. The same URL always yields the same name, and
/// URLs that differ only in the query or in replaced characters still get
/// distinct names.
///
/// # Example
///
/// ```
/// use scopecrawl::output::safe_filename;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/docs/intro").unwrap();
/// let name = safe_filename(&url, "html");
/// assert!(name.starts_with("example.com_docs_intro-"));
/// assert!(name.ends_with(".html"));
/// ```
pub fn safe_filename(url: &Url, ext: &str) -> String {
    let host = url.host_str().unwrap_or("unknown");
    let path = url.path().trim_matches('/');

    let raw_stem = if path.is_empty() {
        format!("{}_index", host)
    } else {
        format!("{}_{}", host, path.replace('/', "_"))
    };

    let stem: String = raw_stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_LEN)
        .collect();

    format!("{}-{}.{}", stem, url_hash(url), ext)
}

/// Returns the truncated hex SHA-256 of a URL
fn url_hash(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    hash
}

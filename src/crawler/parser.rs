//! HTML parser for extracting links
//!
//! Link references are returned as written (trimmed), in document order.
//! Resolution against the page URL and normalization happen in the link
//! extractor so that parsed links and fetcher-reported links share one path.

use scraper::{Html, Selector};

/// Anchors and canonical links, matched as one group to keep document order
const LINK_SELECTOR: &str = "a[href], link[rel='canonical'][href]";

/// Schemes that never lead to a crawlable page
const IGNORED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Extracts followable link references from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only references (same page anchors)
/// - Stylesheets, scripts and images (never selected)
///
/// **Note:** `rel="nofollow"` links ARE followed
///
/// # Arguments
///
/// * `html` - The HTML content to parse
///
/// # Returns
///
/// Raw `href` values in document order, possibly relative. Malformed HTML
/// yields whatever links the parser could recover; it never fails.
///
/// # Example
///
/// ```
/// use scopecrawl::crawler::parse_links;
///
/// let html = r#"<html><body><a href="/page">Link</a><a href="mailto:x@y.z">Mail</a></body></html>"#;
/// assert_eq!(parse_links(html), vec!["/page"]);
/// ```
pub fn parse_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse(LINK_SELECTOR) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::error!("Invalid link selector: {:?}", e);
            return Vec::new();
        }
    };

    document
        .select(&selector)
        .filter(|element| {
            // Download anchors point at files, not pages
            !(element.value().name() == "a" && element.value().attr("download").is_some())
        })
        .filter_map(|element| element.value().attr("href"))
        .filter_map(followable_href)
        .collect()
}

/// Returns the trimmed href if it may lead to another page
fn followable_href(href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if IGNORED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }

    Some(href.to_string())
}

/// Returns the page title, if any
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Test Page</title></head><body></body></html>"#;
        assert_eq!(extract_title(html), Some("Test Page".to_string()));
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        assert_eq!(extract_title(html), Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        assert_eq!(extract_title(html), None);
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        assert_eq!(parse_links(html), vec!["https://other.com/page"]);
    }

    #[test]
    fn test_extract_relative_links_as_written() {
        let html = r#"<html><body><a href="/other">A</a><a href="other">B</a><a href="../up">C</a></body></html>"#;
        assert_eq!(parse_links(html), vec!["/other", "other", "../up"]);
    }

    #[test]
    fn test_href_is_trimmed() {
        let html = r#"<html><body><a href="  /spaced  ">Link</a></body></html>"#;
        assert_eq!(parse_links(html), vec!["/spaced"]);
    }

    #[test]
    fn test_skip_javascript_link() {
        let html = r#"<html><body><a href="javascript:void(0)">Link</a><a href="JavaScript:x()">Link</a></body></html>"#;
        assert!(parse_links(html).is_empty());
    }

    #[test]
    fn test_skip_mailto_link() {
        let html = r#"<html><body><a href="mailto:test@example.com">Email</a></body></html>"#;
        assert!(parse_links(html).is_empty());
    }

    #[test]
    fn test_skip_tel_link() {
        let html = r#"<html><body><a href="tel:+1234567890">Call</a></body></html>"#;
        assert!(parse_links(html).is_empty());
    }

    #[test]
    fn test_skip_data_uri() {
        let html = r#"<html><body><a href="data:text/html,<h1>Test</h1>">Data</a></body></html>"#;
        assert!(parse_links(html).is_empty());
    }

    #[test]
    fn test_skip_download_link() {
        let html = r#"<html><body><a href="/file.zip" download>Download</a></body></html>"#;
        assert!(parse_links(html).is_empty());
    }

    #[test]
    fn test_skip_fragment_only() {
        let html = r##"<html><body><a href="#section">Jump</a><a href="">Empty</a></body></html>"##;
        assert!(parse_links(html).is_empty());
    }

    #[test]
    fn test_follow_nofollow_links() {
        let html = r#"<html><body><a href="/page" rel="nofollow">Link</a></body></html>"#;
        assert_eq!(parse_links(html), vec!["/page"]);
    }

    #[test]
    fn test_extract_canonical_link() {
        let html = r#"<html><head><link rel="canonical" href="https://example.com/canonical" /></head><body></body></html>"#;
        assert_eq!(parse_links(html), vec!["https://example.com/canonical"]);
    }

    #[test]
    fn test_skip_non_canonical_link_elements() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/style.css" />
            <link rel="icon" href="/favicon.ico" />
            <script src="/app.js"></script>
        </head><body><img src="/logo.png" /></body></html>"#;
        assert!(parse_links(html).is_empty());
    }

    #[test]
    fn test_document_order() {
        let html = r#"
            <html>
            <head><link rel="canonical" href="/canonical" /></head>
            <body>
                <nav><a href="/page1">Link 1</a></nav>
                <main><a href="/page2">Link 2</a></main>
                <footer><a href="https://other.com/page3">Link 3</a></footer>
            </body>
            </html>
        "#;
        assert_eq!(
            parse_links(html),
            vec!["/canonical", "/page1", "/page2", "https://other.com/page3"]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        // Dedup is the frontier's job
        let html = r#"<html><body><a href="/a">1</a><a href="/a">2</a></body></html>"#;
        assert_eq!(parse_links(html), vec!["/a", "/a"]);
    }

    #[test]
    fn test_mixed_valid_and_invalid_links() {
        let html = r#"
            <html>
            <body>
                <a href="/valid">Valid</a>
                <a href="javascript:alert('no')">Invalid</a>
                <a href="mailto:test@example.com">Invalid</a>
                <a href="/another-valid">Valid</a>
            </body>
            </html>
        "#;
        assert_eq!(parse_links(html), vec!["/valid", "/another-valid"]);
    }

    #[test]
    fn test_malformed_html() {
        let html = r#"<html><body><div><a href="/ok">unclosed <p><a href="/also-ok">"#;
        assert_eq!(parse_links(html), vec!["/ok", "/also-ok"]);
    }
}

//! HTML to Markdown conversion for saved pages

use crate::crawler::extract_title;

/// Line width used when wrapping converted text
const WRAP_WIDTH: usize = 100;

/// Converts a page's HTML to Markdown
///
/// The page title, when present, becomes a top-level heading. Conversion
/// never fails; markup the converter does not understand is dropped.
///
/// # Example
///
/// ```
/// use scopecrawl::output::html_to_markdown;
///
/// let md = html_to_markdown("<html><head><title>Hello</title></head><body><p>World</p></body></html>");
/// assert!(md.starts_with("# Hello\n"));
/// assert!(md.contains("World"));
/// ```
pub fn html_to_markdown(html: &str) -> String {
    let body = html2text::from_read(html.as_bytes(), WRAP_WIDTH);

    match extract_title(html) {
        Some(title) => format!("# {}\n\n{}", title, body),
        None => body,
    }
}

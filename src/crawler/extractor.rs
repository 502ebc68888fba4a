//! Link extraction: turns a fetched page into new frontier entries

use crate::crawler::dispatcher::{FetchOutcome, FetchResult};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::parse_links;
use crate::url::{normalize_with_base, truncate_for_display};
use url::Url;

/// Feeds the links of each fetched page back into the frontier
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkExtractor {
    /// Malformed links dropped so far
    malformed: usize,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers every link of a successful fetch to the frontier
    ///
    /// Parsed links come first, then links reported by the fetcher. Each is
    /// resolved against the page's final URL and normalized; malformed links
    /// are dropped. Admitted links sit one hop deeper than the page.
    ///
    /// # Returns
    ///
    /// The newly admitted URLs in document order. Failed and skipped results
    /// yield nothing.
    pub fn extract(&mut self, frontier: &mut Frontier, result: &FetchResult) -> Vec<Url> {
        let page = match &result.outcome {
            FetchOutcome::Success { page } => page,
            FetchOutcome::Failure { .. } | FetchOutcome::Skipped { .. } => return Vec::new(),
        };

        let depth = result.depth.saturating_add(1);
        let mut admitted = Vec::new();

        let parsed = parse_links(&page.html);
        for raw in parsed.iter().chain(page.links.iter()) {
            let url = match normalize_with_base(raw, &page.final_url) {
                Ok(url) => url,
                Err(e) => {
                    self.malformed += 1;
                    tracing::debug!(
                        "Dropping link '{}' on {}: {}",
                        truncate_for_display(raw),
                        result.url,
                        e
                    );
                    continue;
                }
            };

            if frontier.offer(url.clone(), depth) {
                admitted.push(url);
            }
        }

        tracing::debug!(
            "{}: {} links, {} new",
            truncate_for_display(result.url.as_str()),
            parsed.len() + page.links.len(),
            admitted.len()
        );

        admitted
    }

    /// Returns the number of malformed links dropped so far
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }
}

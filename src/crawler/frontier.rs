//! Crawl frontier: the set of known, pending, in-flight and finished URLs
//!
//! This module handles:
//! - Deduplication of every URL the crawl encounters
//! - FIFO ordering of pending URLs (breadth-first with one worker)
//! - The Pending → In-flight → Done lifecycle of each URL
//! - Accumulating discovered URLs in admission order
//!
//! The frontier is owned by the coordinator task and only mutated there, so
//! its operations need no locking.

use crate::state::{PageState, Partition};
use crate::url::{dedup_key, normalize_url, Scope};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use url::Url;

/// A URL claimed from the frontier, ready to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// The URL to fetch
    pub url: Url,

    /// Link hops from the nearest start URL
    pub depth: u32,
}

/// Everything the frontier knows about one URL
#[derive(Debug, Clone)]
struct Entry {
    url: Url,
    depth: u32,
    state: PageState,
}

/// Partition sizes, as observed at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrontierCounts {
    pub pending: usize,
    pub in_flight: usize,
    pub fetched: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl FrontierCounts {
    /// Number of URLs in the Done partition
    pub fn done(&self) -> usize {
        self.fetched + self.failed + self.skipped
    }

    /// Number of URLs ever admitted
    pub fn total(&self) -> usize {
        self.pending + self.in_flight + self.done()
    }
}

/// The crawl frontier
///
/// Invariants:
/// - every admitted URL is in exactly one of Pending, In-flight or Done
/// - a URL is admitted at most once (keyed by [`dedup_key`])
/// - states only move forward: Pending → In-flight → Done
pub struct Frontier {
    /// Scope applied to every offered URL
    scope: Scope,

    /// All URLs ever admitted, keyed by scheme-agnostic identity
    entries: HashMap<String, Entry>,

    /// Keys of pending URLs in admission order
    pending: VecDeque<String>,

    /// Keys of all admitted URLs in admission order
    discovered: Vec<String>,

    /// Number of URLs currently in flight
    in_flight: usize,
}

impl Frontier {
    /// Creates an empty frontier for the given scope
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            entries: HashMap::new(),
            pending: VecDeque::new(),
            discovered: Vec::new(),
            in_flight: 0,
        }
    }

    /// Normalizes and admits start URLs at depth 0
    ///
    /// Malformed and out-of-scope seeds are logged and dropped.
    ///
    /// # Returns
    ///
    /// The number of seeds admitted
    pub fn seed<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut admitted = 0;

        for raw in urls {
            let raw = raw.as_ref();
            let url = match normalize_url(raw) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Ignoring malformed start URL {}: {}", raw, e);
                    continue;
                }
            };

            if !self.scope.is_in_scope(&url) {
                tracing::warn!("Start URL {} is outside the crawl scope", raw);
                continue;
            }

            if self.offer(url, 0) {
                admitted += 1;
            }
        }

        admitted
    }

    /// Offers a normalized URL to the frontier
    ///
    /// The URL is admitted to Pending iff it has never been seen and is in
    /// scope. Offering a URL that is pending, in flight or done is a no-op,
    /// except that an `https` sighting upgrades a URL first seen as `http`.
    /// The admitted URL is kept as first seen, trailing slash included, since
    /// it is what gets fetched and what relative links resolve against.
    ///
    /// # Returns
    ///
    /// `true` if the URL was newly admitted
    pub fn offer(&mut self, url: Url, depth: u32) -> bool {
        let key = dedup_key(&url);

        if let Some(entry) = self.entries.get_mut(&key) {
            // The first-seen form is kept; only the scheme is upgraded
            if entry.url.scheme() == "http"
                && url.scheme() == "https"
                && entry.url.set_scheme("https").is_ok()
            {
                tracing::debug!("Unified {} on https", entry.url);
            }
            return false;
        }

        if !self.scope.is_in_scope(&url) {
            return false;
        }

        tracing::debug!("Admitted {} at depth {}", url, depth);
        self.entries.insert(
            key.clone(),
            Entry {
                url,
                depth,
                state: PageState::Pending,
            },
        );
        self.pending.push_back(key.clone());
        self.discovered.push(key);
        true
    }

    /// Moves up to `max` URLs from Pending to In-flight
    ///
    /// Never blocks; returns fewer URLs (possibly none) when fewer are pending.
    pub fn claim(&mut self, max: usize) -> Vec<QueuedUrl> {
        let mut claimed = Vec::with_capacity(max.min(self.pending.len()));

        while claimed.len() < max {
            let Some(key) = self.pending.pop_front() else {
                break;
            };

            // Only pending keys are ever queued
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.state = PageState::InFlight;
                self.in_flight += 1;
                claimed.push(QueuedUrl {
                    url: entry.url.clone(),
                    depth: entry.depth,
                });
            }
        }

        claimed
    }

    /// Moves a URL from In-flight to Done with the given terminal state
    ///
    /// # Returns
    ///
    /// `true` if the URL was in flight and is now done. Completing a URL
    /// that is not in flight, or with a non-terminal state, changes nothing.
    pub fn complete(&mut self, url: &Url, state: PageState) -> bool {
        if !state.is_terminal() {
            tracing::warn!("Refusing to complete {} with active state {}", url, state);
            return false;
        }

        match self.entries.get_mut(&dedup_key(url)) {
            Some(entry) if entry.state == PageState::InFlight => {
                entry.state = state;
                self.in_flight -= 1;
                true
            }
            Some(entry) => {
                tracing::warn!("Cannot complete {}: it is {}", url, entry.state);
                false
            }
            None => {
                tracing::warn!("Cannot complete {}: never admitted", url);
                false
            }
        }
    }

    /// Returns true iff nothing is pending and nothing is in flight
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }

    /// Returns the state of a URL, if it was ever admitted
    pub fn state_of(&self, url: &Url) -> Option<PageState> {
        self.entries.get(&dedup_key(url)).map(|entry| entry.state)
    }

    /// Returns every admitted URL in admission order
    pub fn discovered(&self) -> Vec<Url> {
        self.discovered
            .iter()
            .filter_map(|key| self.entries.get(key))
            .map(|entry| entry.url.clone())
            .collect()
    }

    /// Returns the current partition sizes
    pub fn counts(&self) -> FrontierCounts {
        let mut counts = FrontierCounts::default();
        for entry in self.entries.values() {
            match entry.state {
                PageState::Pending => counts.pending += 1,
                PageState::InFlight => counts.in_flight += 1,
                PageState::Fetched => counts.fetched += 1,
                PageState::Failed => counts.failed += 1,
                PageState::Skipped => counts.skipped += 1,
            }
        }
        counts
    }

    /// Number of URLs waiting to be claimed
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of URLs currently in flight
    pub fn in_flight_len(&self) -> usize {
        self.in_flight
    }

    /// Number of URLs ever admitted
    pub fn seen_len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the scope this frontier filters with
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Number of URLs in the given partition
    pub fn partition_len(&self, partition: Partition) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state.partition() == partition)
            .count()
    }
}

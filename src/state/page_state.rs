/// Page state definitions for tracking crawl progress
///
/// This module defines every state a URL can be in once the frontier has
/// admitted it.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a URL in the crawl
///
/// `Pending` and `InFlight` are the active partitions of the frontier; every
/// other state belongs to the Done partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    // ===== Active States =====
    /// Admitted and waiting to be claimed
    Pending,

    /// Claimed by the dispatcher; fetch result not yet received
    InFlight,

    // ===== Done States =====
    /// Fetched successfully
    Fetched,

    /// Fetch failed (timeout, HTTP error, network error, fetcher fault)
    Failed,

    /// Resolved without fetching (skipped extension, depth or page cap)
    Skipped,
}

/// The three disjoint partitions of the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Pending,
    InFlight,
    Done,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if the URL may still be fetched or is being fetched
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InFlight)
    }

    /// Returns true if this represents a successful fetch
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched)
    }

    /// Returns the frontier partition this state belongs to
    pub fn partition(&self) -> Partition {
        match self {
            Self::Pending => Partition::Pending,
            Self::InFlight => Partition::InFlight,
            Self::Fetched | Self::Failed | Self::Skipped => Partition::Done,
        }
    }

    /// Returns a stable lowercase name, used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::InFlight,
            Self::Fetched,
            Self::Failed,
            Self::Skipped,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

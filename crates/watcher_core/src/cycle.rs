use std::fmt;

use thiserror::Error;

/// Terminal state of one fetch→reconcile→notify→commit cycle.
///
/// Every cycle ends in exactly one of these; no error propagates raw past
/// the coordinator, and none of them prevents the next cycle from running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// New links were notified and durably committed.
    Completed { new_links: usize },
    /// Fetch succeeded but every link was already known.
    Idle,
    /// The cycle stopped before touching the store.
    Aborted(AbortReason),
    /// Notification or commit failed. The new links remain uncommitted and
    /// will be re-surfaced by the next cycle.
    Failed(CycleError),
}

/// Why a cycle aborted without mutating the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The fetcher reported a failure (network, HTTP status, parse).
    FetchFailed(String),
    /// The fetcher returned zero links, which is treated as a suspected
    /// fetch failure rather than "no new documents".
    EmptyFetch,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            AbortReason::EmptyFetch => {
                write!(f, "fetch returned zero links (suspected upstream failure)")
            }
        }
    }
}

/// Failure after reconciliation found new links. Causes are carried as
/// strings so this crate stays free of transport and storage types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
    #[error("link store commit failed: {0}")]
    Storage(String),
}

//! Watcher core: pure link normalization and reconciliation logic.
mod cycle;
mod link;
mod reconcile;

pub use cycle::{AbortReason, CycleError, CycleOutcome};
pub use link::{normalize, Link};
pub use reconcile::{reconcile, FetchedBatch, KnownLinks, Reconciliation, ReconcileError};

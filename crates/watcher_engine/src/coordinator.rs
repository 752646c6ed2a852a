use std::sync::Arc;

use watch_logging::{watch_info, watch_warn};
use watcher_core::{
    reconcile, AbortReason, CycleError, CycleOutcome, KnownLinks, Link, ReconcileError,
};

use crate::{Fetcher, LinkStore, Notifier};

/// Adapts the engine's store to the membership view reconciliation expects.
struct StoreView<'a>(&'a dyn LinkStore);

impl KnownLinks for StoreView<'_> {
    fn contains(&self, link: &Link) -> bool {
        self.0.contains(link)
    }
}

/// Runs one fetch→reconcile→notify→commit cycle per invocation.
///
/// Commit ordering is deliberately conservative: the store is only written
/// after notification succeeds (or is skipped by configuration). A crash or
/// failure anywhere before the commit leaves the new links absent from the
/// store, so the next cycle re-surfaces them. The trade is a possible
/// duplicate notification on retry, never a silently lost link.
pub struct CycleCoordinator {
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn LinkStore>,
    skip_notification: bool,
}

impl CycleCoordinator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn LinkStore>,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            store,
            skip_notification: false,
        }
    }

    /// Commit without notifying. Useful for seeding the store on first run.
    pub fn with_skip_notification(mut self, skip: bool) -> Self {
        self.skip_notification = skip;
        self
    }

    /// Drives one cycle to a terminal outcome. Errors from collaborators
    /// never propagate raw; every path ends in a `CycleOutcome` and the
    /// process stays re-driveable.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let fetched = match self.fetcher.fetch().await {
            Ok(batch) => batch,
            Err(err) => {
                watch_warn!("Fetch failed, aborting cycle: {}", err);
                return CycleOutcome::Aborted(AbortReason::FetchFailed(err.to_string()));
            }
        };
        watch_info!(
            "Fetched {} distinct links from {} listing pages",
            fetched.links.len(),
            fetched.pages_ok
        );

        let view = StoreView(self.store.as_ref());
        let reconciliation = match reconcile(&fetched, &view) {
            Ok(reconciliation) => reconciliation,
            Err(ReconcileError::EmptyFetch) => {
                watch_warn!("Fetch returned zero links, treating as suspected failure");
                return CycleOutcome::Aborted(AbortReason::EmptyFetch);
            }
        };

        if reconciliation.new_links.is_empty() {
            watch_info!(
                "All {} fetched links already known, nothing to do",
                reconciliation.fetched_count
            );
            return CycleOutcome::Idle;
        }

        if self.skip_notification {
            watch_info!(
                "Notification skipped by configuration for {} new links",
                reconciliation.new_links.len()
            );
        } else if let Err(err) = self.notifier.notify(&reconciliation.new_links).await {
            watch_warn!("Notification failed, new links stay uncommitted: {}", err);
            return CycleOutcome::Failed(CycleError::Delivery(err.to_string()));
        }

        match self.store.append(&reconciliation.new_links) {
            Ok(report) => {
                watch_info!(
                    "Committed {} new links ({} already present)",
                    report.appended,
                    report.already_present
                );
                CycleOutcome::Completed {
                    new_links: reconciliation.new_links.len(),
                }
            }
            Err(err) => {
                watch_warn!(
                    "Commit failed, links stay eligible for the next cycle: {}",
                    err
                );
                CycleOutcome::Failed(CycleError::Storage(err.to_string()))
            }
        }
    }
}

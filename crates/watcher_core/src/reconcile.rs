use std::collections::BTreeSet;

use thiserror::Error;

use crate::Link;

/// Links observed during one fetch pass.
///
/// `pages_ok` counts the listing pages that were fetched and parsed
/// successfully, so callers can tell a degraded fetch from a dead one.
/// The batch is ephemeral; it is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchedBatch {
    pub links: BTreeSet<Link>,
    pub pages_ok: usize,
}

impl FetchedBatch {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Membership view over the durable known-link set.
///
/// The store supplies this; reconciliation itself never touches IO.
pub trait KnownLinks {
    fn contains(&self, link: &Link) -> bool;
}

impl<T: KnownLinks + ?Sized> KnownLinks for &T {
    fn contains(&self, link: &Link) -> bool {
        (**self).contains(link)
    }
}

/// Result of reconciling a fetched batch against the known-link set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Fetched links absent from the known set, deduplicated.
    pub new_links: BTreeSet<Link>,
    /// Distinct links in the fetched batch.
    pub fetched_count: usize,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// Zero links fetched. Treated as a suspected upstream fetch failure,
    /// never as "nothing changed": a listing page that really has no
    /// documents still yields its boilerplate links, so an empty batch
    /// almost always means the fetch or the selector broke.
    #[error("fetch returned zero links; suspected upstream fetch failure")]
    EmptyFetch,
}

/// Computes the new-link batch: exactly the fetched links the store does not
/// know yet. Pure set difference, no side effects.
pub fn reconcile(
    fetched: &FetchedBatch,
    known: &dyn KnownLinks,
) -> Result<Reconciliation, ReconcileError> {
    if fetched.links.is_empty() {
        return Err(ReconcileError::EmptyFetch);
    }

    let new_links = fetched
        .links
        .iter()
        .filter(|link| !known.contains(link))
        .cloned()
        .collect();

    Ok(Reconciliation {
        new_links,
        fetched_count: fetched.links.len(),
    })
}

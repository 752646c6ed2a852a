//! Watcher engine: IO collaborators and the cycle coordinator.
mod coordinator;
mod fetch;
mod notify;
mod store;

pub use coordinator::CycleCoordinator;
pub use fetch::{FetchError, FetchSettings, Fetcher, ListingPageFetcher};
pub use notify::{DeliveryError, LogOnlyNotifier, Notifier, WebhookNotifier};
pub use store::{AppendReport, FileLinkStore, LinkRecord, LinkStore, StoreError};

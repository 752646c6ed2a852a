//! Driver binary: loads configuration, runs exactly one watch cycle and
//! maps the outcome to an exit code a scheduler can alert on.

mod config;
mod logging;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;
use url::Url;
use watch_logging::{watch_error, watch_info, watch_warn};
use watcher_core::CycleOutcome;
use watcher_engine::{
    CycleCoordinator, DeliveryError, FetchError, FetchSettings, FileLinkStore, ListingPageFetcher,
    LogOnlyNotifier, Notifier, StoreError, WebhookNotifier,
};

use config::{ConfigSource, WatcherConfig};

#[derive(Debug, Error)]
enum StartupError {
    #[error("invalid base_url: {0}")]
    InvalidBaseUrl(url::ParseError),
    #[error("invalid webhook_url: {0}")]
    InvalidWebhookUrl(url::ParseError),
    #[error(transparent)]
    Fetcher(#[from] FetchError),
    #[error(transparent)]
    Notifier(#[from] DeliveryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("could not start async runtime: {0}")]
    Runtime(std::io::Error),
}

fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "watcher.ron".to_string());

    let loaded = match config::load(Path::new(&config_path)) {
        Ok(loaded) => loaded,
        Err(err) => {
            // Logger is not up yet; this has to go straight to stderr.
            eprintln!("Invalid configuration in {config_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    logging::initialize(loaded.config.log_destination);
    match &loaded.source {
        ConfigSource::File(path) => watch_info!("Loaded configuration from {:?}", path),
        ConfigSource::Defaults => {
            watch_warn!(
                "Config file {} not found, using built-in defaults",
                config_path
            );
        }
    }

    let outcome = match run_one_cycle(&loaded.config) {
        Ok(outcome) => outcome,
        Err(err) => {
            watch_error!("Startup failed: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match outcome {
        CycleOutcome::Completed { new_links } => {
            watch_info!("Cycle completed with {} new links", new_links);
            ExitCode::SUCCESS
        }
        CycleOutcome::Idle => {
            watch_info!("Cycle idle, no new links");
            ExitCode::SUCCESS
        }
        CycleOutcome::Aborted(reason) => {
            watch_warn!("Cycle aborted: {}", reason);
            ExitCode::FAILURE
        }
        CycleOutcome::Failed(err) => {
            watch_error!("Cycle failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_one_cycle(config: &WatcherConfig) -> Result<CycleOutcome, StartupError> {
    let base_url = Url::parse(&config.base_url).map_err(StartupError::InvalidBaseUrl)?;
    let settings = FetchSettings {
        base_url,
        link_selector: config.link_selector.clone(),
        page_count: config.page_count,
        ..FetchSettings::default()
    };
    let fetcher = Arc::new(ListingPageFetcher::new(settings)?);

    let notifier: Arc<dyn Notifier> = match &config.webhook_url {
        Some(raw) => {
            let endpoint = Url::parse(raw).map_err(StartupError::InvalidWebhookUrl)?;
            Arc::new(WebhookNotifier::new(endpoint, config.subject.clone())?)
        }
        None => Arc::new(LogOnlyNotifier::new(config.subject.clone())),
    };

    let store = Arc::new(FileLinkStore::open(config.state_path.clone())?);

    let coordinator = CycleCoordinator::new(fetcher, notifier, store)
        .with_skip_notification(config.skip_notification);

    let runtime = tokio::runtime::Runtime::new().map_err(StartupError::Runtime)?;
    Ok(runtime.block_on(coordinator.run_cycle()))
}

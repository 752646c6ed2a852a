use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use thiserror::Error;
use url::Url;
use watch_logging::watch_info;
use watcher_core::Link;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("notification endpoint returned http status {0}")]
    HttpStatus(u16),
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Delivers the new-link batch to the configured recipient. Any failure
/// blocks the commit; the coordinator relies on that to avoid silently
/// losing links.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, links: &BTreeSet<Link>) -> Result<(), DeliveryError>;
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    links: Vec<&'a str>,
}

/// POSTs the new-link batch as JSON to a webhook endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: Url,
    subject: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: Url, subject: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            subject: subject.into(),
        })
    }
}

/// Logs the new-link batch instead of delivering it anywhere. Used when no
/// webhook endpoint is configured, so a cycle still reports its findings.
pub struct LogOnlyNotifier {
    subject: String,
}

impl LogOnlyNotifier {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for LogOnlyNotifier {
    async fn notify(&self, links: &BTreeSet<Link>) -> Result<(), DeliveryError> {
        watch_info!("{} ({} links):", self.subject, links.len());
        for link in links {
            watch_info!("  {}", link);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, links: &BTreeSet<Link>) -> Result<(), DeliveryError> {
        let payload = WebhookPayload {
            subject: &self.subject,
            links: links.iter().map(Link::as_str).collect(),
        };
        let body = serde_json::to_string(&payload)
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::HttpStatus(status.as_u16()));
        }

        watch_info!("Delivered notification for {} new links", links.len());
        Ok(())
    }
}

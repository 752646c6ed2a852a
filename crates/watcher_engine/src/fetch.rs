use std::time::Duration;

use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;
use watch_logging::{watch_debug, watch_warn};
use watcher_core::{normalize, FetchedBatch};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Listing page URL; `?page={n}` is appended per page, 1-based.
    pub base_url: Url,
    /// CSS selector matching the anchor elements that carry document links.
    pub link_selector: String,
    /// How many listing pages to walk each cycle.
    pub page_count: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://open.canada.ca/en/search/ati")
                .expect("default base url is valid"),
            link_selector: "div.col-sm-8 h4.mrgn-tp-0 a".to_string(),
            page_count: 2,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("watcher/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid link selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("could not build http client: {0}")]
    Client(String),
    #[error("all {pages} listing pages failed; last error: {last}")]
    AllPagesFailed { pages: usize, last: String },
}

/// Produces the fetched batch for one cycle. Must fail distinctly from
/// returning zero links, so callers can tell a dead fetch from a quiet site.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self) -> Result<FetchedBatch, FetchError>;
}

/// Fetches `page_count` listing pages over HTTP and extracts document links
/// with a CSS selector. A single failing page is logged and skipped; the
/// fetch as a whole fails only when every page fails.
#[derive(Debug)]
pub struct ListingPageFetcher {
    settings: FetchSettings,
    selector: Selector,
    client: reqwest::Client,
}

impl ListingPageFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let selector =
            Selector::parse(&settings.link_selector).map_err(|err| FetchError::InvalidSelector {
                selector: settings.link_selector.clone(),
                message: err.to_string(),
            })?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;

        Ok(Self {
            settings,
            selector,
            client,
        })
    }

    fn page_url(&self, page: usize) -> String {
        format!("{}?page={}", self.settings.base_url, page)
    }

    async fn fetch_page(&self, url: &str) -> Result<String, PageError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::HttpStatus(status.as_u16()));
        }

        response.text().await.map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl Fetcher for ListingPageFetcher {
    async fn fetch(&self) -> Result<FetchedBatch, FetchError> {
        let mut batch = FetchedBatch::default();
        let mut last_error: Option<PageError> = None;

        for page in 1..=self.settings.page_count {
            let url = self.page_url(page);
            match self.fetch_page(&url).await {
                Ok(body) => {
                    let found = extract_links(&body, &self.selector, &self.settings.base_url, &mut batch);
                    watch_debug!("Page {} yielded {} links", page, found);
                    batch.pages_ok += 1;
                }
                Err(err) => {
                    watch_warn!("Skipping listing page {}: {}", url, err);
                    last_error = Some(err);
                }
            }
        }

        if batch.pages_ok == 0 {
            let last = last_error
                .map(|err| err.to_string())
                .unwrap_or_else(|| "no pages configured".to_string());
            return Err(FetchError::AllPagesFailed {
                pages: self.settings.page_count,
                last,
            });
        }

        Ok(batch)
    }
}

/// Extracts and normalizes hrefs from one listing page. Runs synchronously
/// so the parsed DOM never lives across an await point.
fn extract_links(body: &str, selector: &Selector, base: &Url, batch: &mut FetchedBatch) -> usize {
    let document = Html::parse_document(body);
    let mut found = 0;
    for element in document.select(selector) {
        let Some(raw) = element.value().attr("href") else {
            continue;
        };
        if let Some(link) = normalize(raw, Some(base)) {
            batch.links.insert(link);
            found += 1;
        }
    }
    found
}

#[derive(Debug, Error)]
enum PageError {
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

fn map_reqwest_error(err: reqwest::Error) -> PageError {
    if err.is_timeout() {
        return PageError::Timeout;
    }
    PageError::Network(err.to_string())
}

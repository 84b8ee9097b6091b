//! Concurrent page fetching
//!
//! Every search result is fetched and extracted independently. A source that
//! fails at any step is simply left out of the batch.

use crate::config::Settings;
use crate::error::ChatbotError;
use crate::models::{ScrapedPage, SearchResultItem};
use crate::Result;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info};

pub mod extract;
pub use extract::{HtmlTextExtractor, TextExtractor};

/// Progress callback: `(title, url)` of a source that was processed.
pub type OnProcessed<'a> = &'a (dyn Fn(&str, &str) + Send + Sync);

/// Trait for fetching and extracting a batch of sources
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch every item concurrently.
    ///
    /// The result keeps input order among the items that succeeded.
    /// `on_processed` runs once per successful item, in completion order.
    async fn fetch_all(
        &self,
        items: &[SearchResultItem],
        on_processed: OnProcessed<'_>,
    ) -> Vec<ScrapedPage>;
}

pub struct HttpPageFetcher {
    client: Client,
    extractor: Arc<dyn TextExtractor>,
}

impl HttpPageFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: settings.http_client()?,
            extractor: Arc::new(HtmlTextExtractor),
        })
    }

    /// Replace the default HTML extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    async fn fetch_one(
        &self,
        item: &SearchResultItem,
        on_processed: OnProcessed<'_>,
    ) -> Result<ScrapedPage> {
        let failed = |reason: String| ChatbotError::FetchItemFailed {
            url: item.url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(item.url.clone())
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("status {}", status)));
        }

        let html = response.text().await.map_err(|e| failed(e.to_string()))?;

        let extractor = self.extractor.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&html))
            .await
            .map_err(|e| failed(format!("extraction task failed: {}", e)))?
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| failed("no readable text".to_string()))?;

        on_processed(&item.title, item.url.as_str());

        Ok(ScrapedPage {
            title: item.title.clone(),
            url: item.url.clone(),
            text,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_all(
        &self,
        items: &[SearchResultItem],
        on_processed: OnProcessed<'_>,
    ) -> Vec<ScrapedPage> {
        let outcomes = join_all(items.iter().map(|item| self.fetch_one(item, on_processed))).await;

        let pages: Vec<ScrapedPage> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(page) => Some(page),
                Err(e) => {
                    debug!(error = %e, "Skipping source");
                    None
                }
            })
            .collect();

        info!(
            requested = items.len(),
            fetched = pages.len(),
            "Page batch complete"
        );

        pages
    }
}

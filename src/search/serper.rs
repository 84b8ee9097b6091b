//! Google search through serper.dev

use super::SearchProvider;
use crate::config::Settings;
use crate::error::ChatbotError;
use crate::models::SearchResultItem;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub struct SerperSearch {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl SerperSearch {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: settings.http_client()?,
            api_key: settings.serper_api_key.clone(),
            endpoint: settings.serper_endpoint.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResultItem>> {
        let request = SerperRequest { q: query, num: top_k };

        info!(query = %query, top_k, "Calling search provider");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Search request failed: {}", e);
                ChatbotError::SearchUnavailable(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Search provider error response: {}", body);
            return Err(ChatbotError::SearchUnavailable(format!(
                "provider returned {}",
                status
            )));
        }

        let payload: SerperResponse = response.json().await.map_err(|e| {
            error!("Failed to parse search response: {}", e);
            ChatbotError::SearchUnavailable(format!("unreadable response: {}", e))
        })?;

        let items = select_results(payload.organic, top_k);

        debug!(results = items.len(), "Search results parsed");

        Ok(items)
    }
}

/// Keep the first `top_k` raw candidates, then drop the invalid ones.
fn select_results(organic: Vec<OrganicResult>, top_k: usize) -> Vec<SearchResultItem> {
    organic
        .into_iter()
        .take(top_k)
        .filter_map(|raw| {
            let title = present(raw.title).or(raw.title_raw).unwrap_or_default();
            let url = present(raw.link).or(raw.url).unwrap_or_default();
            let snippet = present(raw.snippet).or(raw.snippet_raw);
            SearchResultItem::parse(&title, &url, snippet)
        })
        .collect()
}

/// Empty strings count as missing so the raw fallbacks apply.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Default, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    #[serde(rename = "titleRaw")]
    title_raw: Option<String>,
    link: Option<String>,
    url: Option<String>,
    snippet: Option<String>,
    #[serde(rename = "snippetRaw")]
    snippet_raw: Option<String>,
}

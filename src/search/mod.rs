//! Web search providers
//!
//! A provider turns a query into a ranked list of candidate sources.

use crate::models::SearchResultItem;
use crate::Result;
use async_trait::async_trait;

pub mod serper;
pub use serper::SerperSearch;

/// Trait for web search backends
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return at most `top_k` results, most relevant first.
    ///
    /// Upstream failures are reported as `SearchUnavailable`. Candidates
    /// with an invalid URL are dropped, so fewer than `top_k` may come back.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResultItem>>;
}

//! Web search providers.
//!
//! [`StubSearch`] answers every query with one fixed result and is used when
//! no search credentials are configured. [`GoogleCustomSearch`] calls the
//! Custom Search JSON API.

pub mod google;
pub mod stub;

pub use google::GoogleCustomSearch;
pub use stub::StubSearch;

use std::sync::Arc;

use tracing::info;

use crate::config::SearchConfig;
use crate::models::SearchResultItem;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A ranked web search backend.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync + std::fmt::Debug {
    async fn search(&self, query: &str) -> Result<Vec<SearchResultItem>, SearchError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

/// Pick the provider for the configured credentials.
pub fn from_config(cfg: &SearchConfig) -> Result<Arc<dyn SearchProvider>, SearchError> {
    match cfg.credentials() {
        Some((key, cx)) => {
            info!(name: "search.provider.selected", provider = "google", "Using Custom Search API");
            Ok(Arc::new(GoogleCustomSearch::new(
                &cfg.base_url,
                key,
                cx,
                cfg.max_results,
            )?))
        }
        None => {
            info!(
                name: "search.provider.selected",
                provider = "stub",
                "No search credentials configured; serving mock results"
            );
            Ok(Arc::new(StubSearch))
        }
    }
}

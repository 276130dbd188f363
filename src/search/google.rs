//! Google Custom Search JSON API client.

use serde::Deserialize;
use tracing::debug;

use crate::models::SearchResultItem;

use super::{SearchError, SearchProvider};

/// The API caps `num` at 10.
const MAX_NUM: u32 = 10;

/// Longest slice of an error body kept for logs.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Clone)]
pub struct GoogleCustomSearch {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    engine_id: String,
    num: u32,
}

impl std::fmt::Debug for GoogleCustomSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCustomSearch")
            .field("base_url", &self.base_url)
            .field("engine_id", &self.engine_id)
            .field("num", &self.num)
            .finish_non_exhaustive()
    }
}

impl GoogleCustomSearch {
    pub fn new(
        base_url: &str,
        api_key: &str,
        engine_id: &str,
        max_results: u32,
    ) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            engine_id: engine_id.to_string(),
            num: max_results.clamp(1, MAX_NUM),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// Absent when the query has no hits.
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait::async_trait]
impl SearchProvider for GoogleCustomSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResultItem>, SearchError> {
        let num = self.num.to_string();
        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if let Some((cut, _)) = body.char_indices().nth(ERROR_BODY_LIMIT) {
                body.truncate(cut);
            }
            return Err(SearchError::Status { status, body });
        }

        let parsed: SearchResponse = serde_json::from_slice(&resp.bytes().await?)?;
        let results: Vec<SearchResultItem> = parsed
            .items
            .into_iter()
            .map(|item| SearchResultItem {
                title: item.title,
                url: item.link,
                snippet: item.snippet.replace('\n', " "),
            })
            .collect();

        debug!(name: "search.google.completed", hits = results.len(), "Custom Search completed");
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

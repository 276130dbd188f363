use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::models::{SearchResult, SearchResultItem};
use crate::sanitize::sanitize_input;

use super::JsonBody;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
}

/// Run a query against the configured provider and store the results.
pub async fn search(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = sanitize_input(&req.query);
    if query.is_empty() {
        return Err(ApiError::bad_request("Empty query"));
    }

    let results = state.search.search(&query).await?;
    info!(
        name: "search.completed",
        provider = state.search.name(),
        results = results.len(),
        "Search completed"
    );

    let record = SearchResult::new(query, results);
    if let Err(e) = state.store.insert_search_result(&record).await {
        warn!(name: "search.persist.failed", error = %e, "Failed to save search result");
    }

    Ok(Json(SearchResponse {
        results: record.results,
    }))
}

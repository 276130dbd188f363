//! Documents persisted by the service.
//!
//! Each request produces at most one document per collection. Documents are
//! inserted once and never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chat exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Client-supplied `X-Session-ID`, stored verbatim (empty when absent).
    pub session_id: String,
    /// Sanitized user input.
    pub user_message: String,
    /// Text returned by the generation model.
    pub model_response: String,
    /// Whether the client asked for search.
    pub search_used: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(
        session_id: impl Into<String>,
        user_message: impl Into<String>,
        model_response: impl Into<String>,
        search_used: bool,
        sources: Vec<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_message: user_message.into(),
            model_response: model_response.into(),
            search_used,
            sources,
            timestamp: Utc::now(),
        }
    }
}

/// A single ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A search query together with the results returned for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub results: Vec<SearchResultItem>,
    pub timestamp: DateTime<Utc>,
}

impl SearchResult {
    pub fn new(query: impl Into<String>, results: Vec<SearchResultItem>) -> Self {
        Self {
            query: query.into(),
            results,
            timestamp: Utc::now(),
        }
    }
}

/// First sighting of a client session.
///
/// Written once when a session id is first seen; `last_active` equals
/// `created_at` at that point and is never refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl Session {
    pub fn new(
        session_id: impl Into<String>,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            created_at: now,
            last_active: now,
            user_agent,
            ip_address,
        }
    }
}

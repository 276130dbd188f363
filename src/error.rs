//! Request-level error type.
//!
//! Handlers return `Result<T, ApiError>`. Client mistakes are echoed back;
//! dependency failures are logged in full and answered with a generic
//! message so remote error bodies never reach the caller.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

use crate::llm::GenerationError;
use crate::search::SearchError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed body or empty input.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("rate limit exceeded")]
    RateLimited { retry_after: Duration },

    /// Unexpected failure such as a recovered handler panic.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Generation(_) | Self::Search(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::BadRequest(m) => m.clone(),
            Self::Generation(e) => {
                error!(name: "chat.generation.failed", error = %e, "Generation error");
                "Failed to generate response".to_string()
            }
            Self::Search(e) => {
                error!(name: "search.failed", error = %e, "Search error");
                "Search failed".to_string()
            }
            Self::RateLimited { .. } => "Too many requests".to_string(),
            Self::Internal(m) => {
                error!(name: "internal.error", message = %m, "Internal server error");
                "Internal Server Error".to_string()
            }
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();

        if let Self::RateLimited { retry_after } = self {
            let secs = retry_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

use axum::{
    Json,
    extract::State,
    http::{StatusCode, Uri, header},
    response::IntoResponse,
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

pub const SERVICE_NAME: &str = "search-chat-gateway";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": VERSION,
        "service": SERVICE_NAME,
    }))
}

/// HEAD arm for GET-only routes; axum would otherwise answer HEAD with the
/// GET handler.
pub async fn get_only() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET")])
}

/// 200 when the document store answers a ping, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            warn!(name: "db.ping.failed", error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

pub async fn not_found(State(state): State<AppState>, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "path": uri.path(),
            "docs": state.config.server.docs_url,
            "version": VERSION,
        })),
    )
}

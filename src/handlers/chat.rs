use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::models::{ChatMessage, Session};
use crate::sanitize::sanitize_input;

use super::{ClientContext, JsonBody};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub message: String,
    pub search_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_log: Option<Vec<String>>,
}

/// Ordered, human-readable record of what the handler did.
#[derive(Debug, Default)]
struct ThinkingLog(Vec<String>);

impl ThinkingLog {
    fn push(&mut self, entry: impl Into<String>) {
        self.0.push(entry.into());
    }
}

/// Generate a reply to one message and store the exchange.
pub async fn chat(
    State(state): State<AppState>,
    client: ClientContext,
    JsonBody(req): JsonBody<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = sanitize_input(&req.message);
    if message.is_empty() {
        return Err(ApiError::bad_request("Empty message"));
    }

    info!(
        name: "chat.request",
        session_id = %client.session_id,
        chars = message.chars().count(),
        search_enabled = req.search_enabled,
        "Chat request received"
    );

    let mut log = ThinkingLog::default();
    log.push(format!(
        "Received message ({} characters)",
        message.chars().count()
    ));
    if req.search_enabled {
        log.push("Search was requested but is not used to augment the prompt");
    }

    // Prompt is the sanitized message as-is.
    let prompt = message.as_str();
    log.push(format!(
        "Generating response with {}",
        state.generator.model()
    ));
    let reply = state.generator.generate(prompt).await?;

    log.push("Saving conversation");
    let record = ChatMessage::new(
        client.session_id.as_str(),
        message.as_str(),
        reply.as_str(),
        req.search_enabled,
        Vec::new(),
    );
    if let Err(e) = state.store.insert_chat_message(&record).await {
        warn!(name: "chat.persist.failed", error = %e, "Failed to save chat message");
    }

    if !client.session_id.is_empty() {
        let session = Session::new(
            client.session_id.as_str(),
            client.user_agent.clone(),
            client.ip.map(|ip| ip.to_string()),
        );
        match state.store.record_session(&session).await {
            Ok(true) => debug!(name: "session.created", session_id = %client.session_id, "New session recorded"),
            Ok(false) => {}
            Err(e) => warn!(name: "session.persist.failed", error = %e, "Failed to record session"),
        }
    }

    log.push("Response ready");

    Ok(Json(ChatResponse {
        response: reply,
        sources: record.sources,
        thinking_log: state.config.chat.thinking_log.then_some(log.0),
    }))
}

//! Text generation clients.
//!
//! The [`TextGenerator`] trait is the seam handlers depend on; the only
//! production implementation is [`GeminiClient`], which calls the Gemini
//! `generateContent` REST endpoint with fixed sampling parameters.

pub mod gemini;

pub use gemini::GeminiClient;

use crate::config::LlmConfig;

/// Model and sampling parameters used for every generation call.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Base URL of the API (e.g. `https://generativelanguage.googleapis.com`).
    pub base_url: String,
    pub api_key: String,
    /// Model identifier (e.g. `gemini-1.5-flash`).
    pub model: String,
    pub temperature: f32,
    /// Nucleus-sampling threshold.
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Whole-request timeout for the remote call.
    pub timeout: std::time::Duration,
}

impl From<&LlmConfig> for GenerationSettings {
    fn from(cfg: &LlmConfig) -> Self {
        Self {
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_output_tokens: cfg.max_output_tokens,
            timeout: std::time::Duration::from_secs(cfg.timeout_secs),
        }
    }
}

/// Errors from a generation call.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Connection, timeout or body read failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// No candidate, or no non-empty text part in the first candidate.
    #[error("empty response from API")]
    EmptyResponse,

    /// The response body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A remote text-generation backend.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Generate text for a single-turn prompt.
    ///
    /// The returned text is never empty.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Model name, for logs and the thinking log.
    fn model(&self) -> &str;
}

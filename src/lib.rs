//! Search-assisted chat gateway
//!
//! A small HTTP service that forwards sanitized user messages to a Gemini
//! model, offers a web search endpoint, and records every exchange in a
//! document store.
//!
//! # Modules
//!
//! - [`server`]: router construction and the serve loop
//! - [`handlers`]: `/chat`, `/search`, `/health`, `/ready` and the 404 fallback
//! - [`middleware`]: request logging, CORS, rate limiting, panic recovery
//! - [`llm`]: generation client
//! - [`search`]: search providers
//! - [`persistence`]: document store
//! - [`sanitize`]: input cleaning

#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod persistence;
pub mod sanitize;
pub mod search;
pub mod server;
pub mod telemetry;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::TextGenerator;
use crate::middleware::{CorsPolicy, RequestLimiter};
use crate::persistence::DocumentStore;
use crate::search::SearchProvider;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Generation client for `/chat`.
    pub generator: Arc<dyn TextGenerator>,
    /// Provider behind `/search`.
    pub search: Arc<dyn SearchProvider>,
    pub store: Arc<dyn DocumentStore>,
    pub rate_limiter: Arc<RequestLimiter>,
    pub cors: CorsPolicy,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        generator: Arc<dyn TextGenerator>,
        search: Arc<dyn SearchProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> anyhow::Result<Self> {
        let cors = CorsPolicy::new(&config.cors.allowed_origin)
            .map_err(|e| anyhow::anyhow!("invalid CORS origin: {e}"))?;
        Ok(Self {
            generator,
            search,
            store,
            rate_limiter: Arc::new(RequestLimiter::new(&config.rate_limit)),
            cors,
            config,
        })
    }
}

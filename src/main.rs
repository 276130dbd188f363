//! Search-assisted chat gateway server
//!
//! Entry point: loads configuration, connects the document store and serves
//! the HTTP API until SIGINT/SIGTERM.

use std::sync::Arc;

use dotenvy::dotenv;
use mimalloc::MiMalloc;
use tracing::{error, info};

use search_chat_gateway::{config::AppConfig, server, telemetry};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    // Load .env (if present)
    let _ = dotenv();

    telemetry::init();

    let config = match AppConfig::load().and_then(|c| c.validate().map(|()| c)) {
        Ok(c) => c,
        Err(e) => {
            error!(name: "config.invalid", error = %e, "Configuration error");
            std::process::exit(1);
        }
    };

    info!(
        name: "config.loaded",
        addr = %config.listen_addr(),
        model = %config.llm.model,
        rate_limit = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if let Err(e) = server::start_server(Arc::new(config)).await {
        error!(name: "server.failed", error = %format!("{e:#}"), "Server exited with error");
        std::process::exit(1);
    }
}

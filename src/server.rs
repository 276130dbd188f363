use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tracing::{info, warn};

use crate::AppState;
use crate::config::AppConfig;
use crate::handlers::{chat, search, system};
use crate::llm::{GeminiClient, GenerationSettings};
use crate::middleware::{
    cors::cors_middleware, rate_limit::rate_limit_middleware, recovery::recovery_layer,
    trace_layer,
};
use crate::persistence::SurrealStore;

/// How often idle rate-limit buckets are dropped.
const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Build the application router with the full middleware stack.
///
/// Every route is served at the root and again under `/api/v1`.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(system::health).head(system::get_only))
        .route("/ready", get(system::ready).head(system::get_only))
        .route("/chat", post(chat::chat))
        .route("/search", post(search::search));

    Router::new()
        .merge(api.clone())
        .nest("/api/v1", api)
        .fallback(system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer())
                .layer(from_fn_with_state(state.cors.clone(), cors_middleware))
                .layer(from_fn_with_state(
                    Arc::clone(&state.rate_limiter),
                    rate_limit_middleware,
                ))
                .layer(recovery_layer()),
        )
        .with_state(state)
}

/// Start the server and block until it has shut down.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let store = Arc::new(SurrealStore::connect(&config.database).await?);

    let settings = GenerationSettings::from(&config.llm);
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        timeout_secs = settings.timeout.as_secs(),
        "LLM configuration loaded"
    );
    let generator = Arc::new(GeminiClient::new(settings)?);
    let search = crate::search::from_config(&config.search)?;

    let state = AppState::new(Arc::clone(&config), generator, search, store)?;
    let shutdown = CancellationToken::new();

    let limiter = Arc::clone(&state.rate_limiter);
    let sweep_token = shutdown.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                () = sweep_token.cancelled() => break,
                _ = interval.tick() => limiter.retain_recent(),
            }
        }
    });

    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        name: "server.started",
        addr = %listener.local_addr()?,
        "Server listening"
    );

    // The router owns the only handle to the store; it is released when the
    // server future is dropped at the end of this block.
    {
        let serve_token = shutdown.clone();
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { serve_token.cancelled().await })
        .into_future();
        tokio::pin!(server);

        tokio::select! {
            res = &mut server => res?,
            () = shutdown_signal() => {
                shutdown.cancel();
                let grace = Duration::from_secs(config.server.shutdown_grace_secs);
                match tokio::time::timeout(grace, &mut server).await {
                    Ok(res) => res?,
                    Err(_) => warn!(
                        name: "server.shutdown.timeout",
                        grace_secs = grace.as_secs(),
                        "In-flight requests did not finish in time"
                    ),
                }
            }
        }
    }
    shutdown.cancel();

    info!(name: "db.disconnected", "Document store handle released");
    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl-C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!(name: "server.shutdown.requested", "Shutdown signal received");
}

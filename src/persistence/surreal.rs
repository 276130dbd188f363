use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::models::{ChatMessage, SearchResult, Session};

use super::{CHAT_MESSAGES, DocumentStore, SEARCH_RESULTS, SESSIONS};

/// SurrealDB-backed document store.
///
/// Works with any engine `surrealdb::engine::any` understands: `ws://` for a
/// server, `surrealkv://path` for an embedded file store, `mem://` in tests.
#[derive(Debug, Clone)]
pub struct SurrealStore {
    db: Surreal<Any>,
    operation_timeout: Duration,
    ping_timeout: Duration,
}

impl SurrealStore {
    /// Connect, select namespace/database and ping once.
    ///
    /// Every step is bounded by `connect_timeout`; failure is returned as-is
    /// and the caller is expected to abort startup.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self> {
        info!(name: "db.connecting", namespace = %cfg.namespace, database = %cfg.database, "Connecting to document store");

        let db = tokio::time::timeout(cfg.connect_timeout(), connect(cfg.url.as_str()))
            .await
            .context("timed out connecting to document store")?
            .context("failed to connect to document store")?;

        if let (Some(username), Some(password)) = (&cfg.username, &cfg.password) {
            tokio::time::timeout(
                cfg.connect_timeout(),
                db.signin(Root {
                    username: username.as_str(),
                    password: password.as_str(),
                }),
            )
            .await
            .context("timed out signing in to document store")?
            .context("document store rejected credentials")?;
        }

        tokio::time::timeout(
            cfg.connect_timeout(),
            db.use_ns(cfg.namespace.clone()).use_db(cfg.database.clone()),
        )
        .await
        .context("timed out selecting namespace")?
        .context("failed to select namespace/database")?;

        let store = Self {
            db,
            operation_timeout: cfg.operation_timeout(),
            ping_timeout: cfg.connect_timeout(),
        };
        store.ping().await.context("document store ping failed")?;

        info!(name: "db.connected", "Connected to document store");
        Ok(Self {
            ping_timeout: cfg.ping_timeout(),
            ..store
        })
    }

    async fn bounded<F, T>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: IntoFuture<Output = surrealdb::Result<T>>,
    {
        within(self.operation_timeout, op, fut).await
    }
}

/// Run one database call, failing with "timed out" once `limit` elapses.
async fn within<F, T>(limit: Duration, op: &'static str, fut: F) -> Result<T>
where
    F: IntoFuture<Output = surrealdb::Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .with_context(|| format!("{op} timed out after {limit:?}"))?
        .with_context(|| format!("{op} failed"))
}

#[async_trait]
impl DocumentStore for SurrealStore {
    async fn insert_chat_message(&self, message: &ChatMessage) -> Result<()> {
        let _: Option<ChatMessage> = self
            .bounded(
                "insert chat message",
                self.db.create(CHAT_MESSAGES).content(message.clone()),
            )
            .await?;
        Ok(())
    }

    async fn insert_search_result(&self, result: &SearchResult) -> Result<()> {
        let _: Option<SearchResult> = self
            .bounded(
                "insert search result",
                self.db.create(SEARCH_RESULTS).content(result.clone()),
            )
            .await?;
        Ok(())
    }

    async fn record_session(&self, session: &Session) -> Result<bool> {
        let id = session.session_id.as_str();
        let existing: Option<Session> = self
            .bounded("select session", self.db.select((SESSIONS, id)))
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        // A concurrent first request for the same id makes this create fail;
        // the session exists either way.
        let created: Result<Option<Session>> = self
            .bounded(
                "create session",
                self.db
                    .create((SESSIONS, id))
                    .content(session.clone()),
            )
            .await;
        match created {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(session_id = %id, error = %e, "Session already recorded");
                Ok(false)
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        within(self.ping_timeout, "ping", self.db.health()).await
    }
}

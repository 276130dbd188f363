//! Document persistence.
//!
//! Handlers talk to a [`DocumentStore`]; production uses [`SurrealStore`].
//! Stores only ever insert: nothing here updates or deletes a document.

pub mod surreal;

pub use surreal::SurrealStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ChatMessage, SearchResult, Session};

pub const CHAT_MESSAGES: &str = "chat_messages";
pub const SEARCH_RESULTS: &str = "search_results";
pub const SESSIONS: &str = "sessions";

#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Insert one chat exchange into `chat_messages`.
    async fn insert_chat_message(&self, message: &ChatMessage) -> Result<()>;

    /// Insert one search into `search_results`.
    async fn insert_search_result(&self, result: &SearchResult) -> Result<()>;

    /// Insert the session if its id has not been seen yet.
    ///
    /// Returns `true` when a new document was written.
    async fn record_session(&self, session: &Session) -> Result<bool>;

    /// Liveness probe with a short timeout.
    async fn ping(&self) -> Result<()>;
}

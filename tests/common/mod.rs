#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum_test::TestServer;

use search_chat_gateway::{
    AppState,
    config::AppConfig,
    llm::{GenerationError, TextGenerator},
    models::{ChatMessage, SearchResult, Session},
    persistence::DocumentStore,
    search::StubSearch,
    server::build_router,
};

/// What the fake model does when asked to generate.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    /// A numbered reply quoting the prompt.
    Echo,
    /// The API answered without any usable text.
    Empty,
    Panic,
}

#[derive(Debug)]
pub struct FakeGenerator {
    reply: Reply,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.reply {
            Reply::Echo => Ok(format!("reply {n}: {prompt}")),
            Reply::Empty => Err(GenerationError::EmptyResponse),
            Reply::Panic => panic!("model client blew up"),
        }
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

/// In-memory store that keeps everything it is given.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub chat_messages: Mutex<Vec<ChatMessage>>,
    pub search_results: Mutex<Vec<SearchResult>>,
    pub sessions: Mutex<Vec<Session>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.chat_messages.lock().unwrap().clone()
    }

    pub fn search_results(&self) -> Vec<SearchResult> {
        self.search_results.lock().unwrap().clone()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn insert_chat_message(&self, message: &ChatMessage) -> anyhow::Result<()> {
        self.chat_messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn insert_search_result(&self, result: &SearchResult) -> anyhow::Result<()> {
        self.search_results.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn record_session(&self, session: &Session) -> anyhow::Result<bool> {
        let mut sessions = self.sessions.lock().unwrap();
        let seen: HashSet<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        if seen.contains(session.session_id.as_str()) {
            return Ok(false);
        }
        sessions.push(session.clone());
        Ok(true)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Store whose every call fails, as if the database went away.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert_chat_message(&self, _message: &ChatMessage) -> anyhow::Result<()> {
        anyhow::bail!("connection reset")
    }

    async fn insert_search_result(&self, _result: &SearchResult) -> anyhow::Result<()> {
        anyhow::bail!("connection reset")
    }

    async fn record_session(&self, _session: &Session) -> anyhow::Result<bool> {
        anyhow::bail!("connection reset")
    }

    async fn ping(&self) -> anyhow::Result<()> {
        anyhow::bail!("ping timed out")
    }
}

/// Defaults with the required keys filled in and rate limiting off.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::load_from_args([
        "search-chat-gateway",
        "--database-url",
        "mem://",
        "--gemini-api-key",
        "test-key",
    ])
    .expect("test config should load");
    config.rate_limit.enabled = false;
    config
}

pub fn server_with(
    config: AppConfig,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn DocumentStore>,
) -> TestServer {
    let state = AppState::new(Arc::new(config), generator, Arc::new(StubSearch), store)
        .expect("state should build");
    TestServer::new(build_router(state)).expect("test server should start")
}

mod common;

use std::collections::HashSet;

use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use serde_json::{Value, json};

use common::{FailingStore, FakeGenerator, RecordingStore, Reply, server_with, test_config};

#[tokio::test]
async fn test_health_returns_fixed_schema() {
    let server = server_with(
        test_config(),
        FakeGenerator::new(Reply::Echo),
        RecordingStore::new(),
    );

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "search-chat-gateway");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_wrong_methods_are_405() {
    let server = server_with(
        test_config(),
        FakeGenerator::new(Reply::Echo),
        RecordingStore::new(),
    );

    assert_eq!(
        server.get("/chat").await.status_code(),
        StatusCode::METHOD_NOT_ALLOWED
    );
    assert_eq!(
        server.get("/search").await.status_code(),
        StatusCode::METHOD_NOT_ALLOWED
    );
    assert_eq!(
        server.post("/health").await.status_code(),
        StatusCode::METHOD_NOT_ALLOWED
    );

    for path in ["/health", "/ready", "/api/v1/health", "/api/v1/ready"] {
        for method in [Method::HEAD, Method::PUT, Method::DELETE, Method::PATCH] {
            let response = server.method(method.clone(), path).await;
            assert_eq!(
                response.status_code(),
                StatusCode::METHOD_NOT_ALLOWED,
                "{method} {path}"
            );
        }
    }
}

#[tokio::test]
async fn test_chat_round_trip_persists_sanitized_message() {
    let generator = FakeGenerator::new(Reply::Echo);
    let store = RecordingStore::new();
    let server = server_with(test_config(), generator.clone(), store.clone());

    let response = server
        .post("/chat")
        .json(&json!({ "message": "<b>hello</b>\nthere", "search_enabled": false }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["response"], "reply 1: hello there");
    assert!(body.get("sources").is_none());

    let saved = store.chat_messages();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].user_message, "hello there");
    assert_eq!(saved[0].model_response, "reply 1: hello there");
    assert!(!saved[0].search_used);
    assert_eq!(saved[0].session_id, "");
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_chat_ignores_content_type() {
    let store = RecordingStore::new();
    let server = server_with(test_config(), FakeGenerator::new(Reply::Echo), store.clone());

    let response = server
        .post("/chat")
        .text(r#"{"message":"plain text body"}"#)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(store.chat_messages().len(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let server = server_with(
        test_config(),
        FakeGenerator::new(Reply::Echo),
        RecordingStore::new(),
    );

    for path in ["/chat", "/search"] {
        let response = server.post(path).text("{not json").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{path}");
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid request body");
    }
}

#[tokio::test]
async fn test_empty_after_sanitizing_is_400() {
    let generator = FakeGenerator::new(Reply::Echo);
    let store = RecordingStore::new();
    let server = server_with(test_config(), generator.clone(), store.clone());

    for message in ["", "   \n\t  ", "<div><span></span></div>", "<!-- hidden -->"] {
        let response = server.post("/chat").json(&json!({ "message": message })).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{message:?}");
        let body: Value = response.json();
        assert_eq!(body["error"], "Empty message");
    }

    let response = server.post("/search").json(&json!({ "query": "<p> </p>" })).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Empty query");

    assert_eq!(generator.calls(), 0);
    assert!(store.chat_messages().is_empty());
    assert!(store.search_results().is_empty());
}

#[tokio::test]
async fn test_generation_without_text_is_500_and_not_persisted() {
    let store = RecordingStore::new();
    let server = server_with(test_config(), FakeGenerator::new(Reply::Empty), store.clone());

    let response = server.post("/chat").json(&json!({ "message": "hello" })).await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to generate response");
    assert!(store.chat_messages().is_empty());
}

#[tokio::test]
async fn test_concurrent_chats_are_independent() {
    let store = RecordingStore::new();
    let server = server_with(test_config(), FakeGenerator::new(Reply::Echo), store.clone());
    let body = json!({ "message": "same question" });

    let responses = futures::future::join_all(
        (0..8).map(|_| server.post("/chat").json(&body).into_future()),
    )
    .await;

    let replies: HashSet<String> = responses
        .iter()
        .map(|r| {
            assert_eq!(r.status_code(), StatusCode::OK);
            r.json::<Value>()["response"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(replies.len(), 8);

    let saved = store.chat_messages();
    assert_eq!(saved.len(), 8);
    let stored: HashSet<&str> = saved.iter().map(|m| m.model_response.as_str()).collect();
    assert_eq!(stored.len(), 8);
}

#[tokio::test]
async fn test_stub_search_returns_one_fixed_item() {
    let store = RecordingStore::new();
    let server = server_with(test_config(), FakeGenerator::new(Reply::Echo), store.clone());

    for query in ["golang", "something else entirely"] {
        let response = server.post("/search").json(&json!({ "query": query })).await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: Value = response.json();
        assert_eq!(
            body,
            json!({
                "results": [{
                    "title": "Example Search Result",
                    "url": "https://example.com",
                    "snippet": "This is a sample search result snippet."
                }]
            })
        );
    }

    let saved = store.search_results();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].query, "golang");
    assert_eq!(saved[0].results.len(), 1);
}

#[tokio::test]
async fn test_options_is_204_with_cors_headers() {
    let server = server_with(
        test_config(),
        FakeGenerator::new(Reply::Echo),
        RecordingStore::new(),
    );

    for path in ["/chat", "/does/not/exist"] {
        let response = server.method(Method::OPTIONS, path).await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "POST, GET, OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, X-Session-ID"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }
}

#[tokio::test]
async fn test_cors_origin_comes_from_config() {
    let mut config = test_config();
    config.cors.allowed_origin = "https://chat.example.org".to_string();
    let server = server_with(config, FakeGenerator::new(Reply::Echo), RecordingStore::new());

    let response = server.get("/health").await;
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://chat.example.org"
    );
}

#[tokio::test]
async fn test_unknown_path_is_404_with_details() {
    let mut config = test_config();
    config.server.docs_url = "https://docs.example.org/api".to_string();
    let server = server_with(config, FakeGenerator::new(Reply::Echo), RecordingStore::new());

    let response = server.get("/nope/here").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(body["path"], "/nope/here");
    assert_eq!(body["docs"], "https://docs.example.org/api");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_routes_served_under_api_prefix() {
    let store = RecordingStore::new();
    let server = server_with(test_config(), FakeGenerator::new(Reply::Echo), store.clone());

    assert_eq!(
        server.get("/api/v1/health").await.status_code(),
        StatusCode::OK
    );
    assert_eq!(
        server
            .post("/api/v1/chat")
            .json(&json!({ "message": "hi" }))
            .await
            .status_code(),
        StatusCode::OK
    );
    assert_eq!(
        server
            .post("/api/v1/search")
            .json(&json!({ "query": "rust" }))
            .await
            .status_code(),
        StatusCode::OK
    );
    assert_eq!(store.chat_messages().len(), 1);
    assert_eq!(store.search_results().len(), 1);
}

#[tokio::test]
async fn test_requests_beyond_burst_get_429() {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.requests_per_second = 1;
    config.rate_limit.burst_size = 2;
    let server = server_with(config, FakeGenerator::new(Reply::Echo), RecordingStore::new());

    assert_eq!(server.get("/health").await.status_code(), StatusCode::OK);
    assert_eq!(server.get("/health").await.status_code(), StatusCode::OK);

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body: Value = response.json();
    assert_eq!(body["error"], "Too many requests");
}

#[tokio::test]
async fn test_rate_limit_is_per_forwarded_client() {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.requests_per_second = 1;
    config.rate_limit.burst_size = 1;
    let server = server_with(config, FakeGenerator::new(Reply::Echo), RecordingStore::new());
    let forwarded = HeaderName::from_static("x-forwarded-for");

    let first = server
        .get("/health")
        .add_header(forwarded.clone(), HeaderValue::from_static("198.51.100.1"))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);

    let repeat = server
        .get("/health")
        .add_header(forwarded.clone(), HeaderValue::from_static("198.51.100.1"))
        .await;
    assert_eq!(repeat.status_code(), StatusCode::TOO_MANY_REQUESTS);

    let other = server
        .get("/health")
        .add_header(forwarded, HeaderValue::from_static("198.51.100.2"))
        .await;
    assert_eq!(other.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_panicking_handler_is_500_and_server_survives() {
    let server = server_with(
        test_config(),
        FakeGenerator::new(Reply::Panic),
        RecordingStore::new(),
    );

    let response = server.post("/chat").json(&json!({ "message": "boom" })).await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Internal Server Error");

    assert_eq!(server.get("/health").await.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_persistence_failure_does_not_change_response() {
    let server = server_with(
        test_config(),
        FakeGenerator::new(Reply::Echo),
        std::sync::Arc::new(FailingStore),
    );

    let chat = server
        .post("/chat")
        .add_header(
            HeaderName::from_static("x-session-id"),
            HeaderValue::from_static("abc"),
        )
        .json(&json!({ "message": "still works" }))
        .await;
    assert_eq!(chat.status_code(), StatusCode::OK);
    assert_eq!(chat.json::<Value>()["response"], "reply 1: still works");

    let search = server.post("/search").json(&json!({ "query": "golang" })).await;
    assert_eq!(search.status_code(), StatusCode::OK);
    assert_eq!(search.json::<Value>()["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ready_reflects_store_ping() {
    let healthy = server_with(
        test_config(),
        FakeGenerator::new(Reply::Echo),
        RecordingStore::new(),
    );
    let response = healthy.get("/ready").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "status": "ready" }));

    let broken = server_with(
        test_config(),
        FakeGenerator::new(Reply::Echo),
        std::sync::Arc::new(FailingStore),
    );
    let response = broken.get("/ready").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>(), json!({ "status": "unavailable" }));
}

#[tokio::test]
async fn test_thinking_log_follows_config() {
    let server = server_with(
        test_config(),
        FakeGenerator::new(Reply::Echo),
        RecordingStore::new(),
    );
    let body: Value = server
        .post("/chat")
        .json(&json!({ "message": "hello", "search_enabled": true }))
        .await
        .json();

    let log: Vec<&str> = body["thinking_log"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(log.first(), Some(&"Received message (5 characters)"));
    assert!(log.iter().any(|l| l.contains("not used to augment")));
    assert!(log.contains(&"Generating response with fake-model"));
    assert_eq!(log.last(), Some(&"Response ready"));

    let mut config = test_config();
    config.chat.thinking_log = false;
    let quiet = server_with(config, FakeGenerator::new(Reply::Echo), RecordingStore::new());
    let body: Value = quiet
        .post("/chat")
        .json(&json!({ "message": "hello" }))
        .await
        .json();
    assert!(body.get("thinking_log").is_none());
}

#[tokio::test]
async fn test_search_flag_is_recorded_without_changing_prompt() {
    let store = RecordingStore::new();
    let server = server_with(test_config(), FakeGenerator::new(Reply::Echo), store.clone());

    let body: Value = server
        .post("/chat")
        .json(&json!({ "message": "what is rust", "search_enabled": true }))
        .await
        .json();
    assert_eq!(body["response"], "reply 1: what is rust");

    let saved = store.chat_messages();
    assert!(saved[0].search_used);
    assert!(saved[0].sources.is_empty());
}

#[tokio::test]
async fn test_session_recorded_once() {
    let store = RecordingStore::new();
    let server = server_with(test_config(), FakeGenerator::new(Reply::Echo), store.clone());
    let session = HeaderName::from_static("x-session-id");

    for message in ["first", "second"] {
        let response = server
            .post("/chat")
            .add_header(session.clone(), HeaderValue::from_static("session-42"))
            .add_header(header::USER_AGENT, HeaderValue::from_static("integration-test"))
            .json(&json!({ "message": message }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let sessions = store.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, "session-42");
    assert_eq!(sessions[0].user_agent.as_deref(), Some("integration-test"));
    assert_eq!(sessions[0].created_at, sessions[0].last_active);

    let messages = store.chat_messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.session_id == "session-42"));
}

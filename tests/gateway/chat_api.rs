use super::gateway_harness::{Client, StubLlm};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use kbchat::chat::LLM_FAILURE_PREFIX;
use kbchat::sessions::{ChatMessage, MessageRole};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn health_and_index_are_public() {
    let mut client = Client::new();
    let (status, body) = client.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let request = Request::get("/").body(Body::empty()).unwrap();
    let response = client.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
}

#[tokio::test]
async fn chat_turns_are_recorded_in_registry_and_log() {
    let mut client = Client::new();

    let (status, body) = client.post("/api/chat", json!({ "message": "hello" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "echo: hello");
    assert_eq!(body["llm_error"], false);
    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert_eq!(session_id.len(), 12);

    let (_, body) = client.post("/api/chat", json!({ "message": "again" })).await;
    assert_eq!(body["session_id"], session_id.as_str());

    let history = client.state.chat.registry().history(&session_id).unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2], ChatMessage::user("again"));

    let records = client.state.chat.transcript(&session_id).unwrap();
    let roles: Vec<_> = records.iter().map(|r| r.role).collect();
    assert_eq!(
        roles,
        [
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant
        ]
    );
    assert!(records.iter().all(|r| r.session_id == session_id));
}

#[tokio::test]
async fn empty_or_malformed_chat_is_rejected() {
    let mut client = Client::new();

    let (status, body) = client.post("/api/chat", json!({ "message": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = client.post("/api/chat", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = client
        .request(Method::POST, "/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = client.send_request(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));

    assert!(client.state.chat.transcripts().unwrap().is_empty());
}

#[tokio::test]
async fn upstream_failure_is_returned_as_reply_with_200() {
    let llm = Arc::new(StubLlm {
        fail: true,
        ..StubLlm::default()
    });
    let mut client = Client::with_llm(llm);

    let (status, body) = client.post("/api/chat", json!({ "message": "hello" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["llm_error"], true);
    let reply = body["reply"].as_str().unwrap();
    assert!(reply.starts_with(LLM_FAILURE_PREFIX));
    assert!(reply.contains("HTTP 503"));

    let session_id = body["session_id"].as_str().unwrap();
    let records = client.state.chat.transcript(session_id).unwrap();
    assert_eq!(records[1].role, MessageRole::Assistant);
    assert_eq!(records[1].message, reply);
}

#[tokio::test]
async fn new_session_drops_history_but_keeps_log() {
    let mut client = Client::new();
    let (_, body) = client.post("/api/chat", json!({ "message": "hello" })).await;
    let old_id = body["session_id"].as_str().unwrap().to_string();

    let (status, body) = client.post("/api/session/new", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let new_id = body["session_id"].as_str().unwrap().to_string();
    assert_ne!(new_id, old_id);

    let (_, info) = client.get("/api/session/info").await;
    assert_eq!(info["session_id"], new_id.as_str());
    assert_eq!(info["history"], json!([]));

    assert!(client.state.chat.registry().history(&old_id).is_none());
    assert_eq!(client.state.chat.transcript(&old_id).unwrap().len(), 2);
}

#[tokio::test]
async fn session_info_reports_history() {
    let mut client = Client::new();
    client.post("/api/chat", json!({ "message": "hello" })).await;

    let (status, info) = client.get("/api/session/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        info["history"],
        json!([
            { "role": "user", "content": "hello" },
            { "role": "assistant", "content": "echo: hello" }
        ])
    );
}

#[tokio::test]
async fn session_info_does_not_register_sessions() {
    let mut client = Client::new();

    for _ in 0..20 {
        client.cookie = None;
        let (status, info) = client.get("/api/session/info").await;
        assert_eq!(status, StatusCode::OK);
        assert!(info["session_id"].is_string());
        assert_eq!(info["history"], json!([]));
    }
    assert_eq!(client.state.chat.registry().len(), 0);

    client.post("/api/chat", json!({ "message": "hello" })).await;
    assert_eq!(client.state.chat.registry().len(), 1);
}

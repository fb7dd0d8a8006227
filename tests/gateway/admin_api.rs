use super::gateway_harness::{Client, StubLlm};
use axum::http::{Method, StatusCode};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn admin_endpoints_require_login() {
    let mut client = Client::new();

    for uri in ["/api/files", "/api/sessions", "/api/system-prompt"] {
        let (status, body) = client.get(uri).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }
    let (status, _) = client.delete("/api/files/a.txt").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = client
        .post("/api/admin/login", json!({ "password": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "success": false }));
    let (_, body) = client.get("/api/admin/status").await;
    assert_eq!(body, json!({ "is_admin": false }));

    client.login().await;
    let (_, body) = client.get("/api/admin/status").await;
    assert_eq!(body, json!({ "is_admin": true }));
    let (status, body) = client.get("/api/files").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "files": [] }));

    let (status, _) = client.post("/api/admin/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = client.get("/api/files").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn forged_cookie_is_an_empty_session() {
    let mut client = Client::new();
    client.cookie = Some("kbchat_session=7b2269735f61646d696e223a747275657d.00".into());

    let (_, body) = client.get("/api/admin/status").await;
    assert_eq!(body, json!({ "is_admin": false }));
    let (status, _) = client.get("/api/files").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn documents_upload_edit_delete_cycle() {
    let mut client = Client::new();
    client.login().await;

    let (status, body) = client
        .upload(&[("faq.md", "Hours: 9-5"), ("tool.exe", "MZ")])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "uploaded": ["faq.md"] }));

    let (_, body) = client.get("/api/files").await;
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "faq.md");
    assert_eq!(files[0]["size"], 10);

    let (status, body) = client.get("/api/files/faq.md").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "faq.md", "content": "Hours: 9-5" }));

    let (status, _) = client
        .send_json(Method::PUT, "/api/files/faq.md", json!({ "content": "Hours: 8-6" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = client.get("/api/files/faq.md").await;
    assert_eq!(body["content"], "Hours: 8-6");

    let (status, _) = client
        .send_json(Method::PUT, "/api/files/missing.md", json!({ "content": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = client.delete("/api/files/faq.md").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    let (status, _) = client.delete("/api/files/faq.md").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = client.get("/api/files/faq.md").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_with_nothing_acceptable_is_rejected() {
    let mut client = Client::new();
    client.login().await;

    let (status, body) = client.upload(&[("run.sh", "echo hi")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn upload_extension_is_checked_after_sanitizing() {
    let mut client = Client::new();
    client.login().await;

    let (status, _) = client.upload(&[("..txt", "x")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = client
        .upload(&[("..txt", "x"), ("../notes.md", "kept")])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "uploaded": ["notes.md"] }));

    let (_, body) = client.get("/api/files").await;
    let names: Vec<_> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["notes.md"]);
}

#[tokio::test]
async fn uploaded_documents_reach_the_llm_in_name_order() {
    let llm = Arc::new(StubLlm::default());
    let mut client = Client::with_llm(llm.clone());
    client.login().await;
    client.upload(&[("b.txt", "Y"), ("a.txt", "X")]).await;

    client.post("/api/chat", json!({ "message": "hi" })).await;
    client.delete("/api/files/b.txt").await;
    client.post("/api/chat", json!({ "message": "hi" })).await;

    let seen = llm.knowledge.lock().unwrap().clone();
    assert_eq!(seen[0], "--- a.txt ---\nX\n\n--- b.txt ---\nY");
    assert_eq!(seen[1], "--- a.txt ---\nX");
}

#[tokio::test]
async fn system_prompt_update_applies_to_next_turn() {
    let llm = Arc::new(StubLlm::default());
    let mut client = Client::with_llm(llm.clone());
    client.login().await;

    let (_, body) = client.get("/api/system-prompt").await;
    assert_eq!(body["prompt"], kbchat::config::DEFAULT_SYSTEM_PROMPT);

    let (status, _) = client
        .send_json(Method::PUT, "/api/system-prompt", json!({ "prompt": "Be terse." }))
        .await;
    assert_eq!(status, StatusCode::OK);
    client
        .send_json(Method::PUT, "/api/system-prompt", json!({}))
        .await;
    let (_, body) = client.get("/api/system-prompt").await;
    assert_eq!(body["prompt"], "Be terse.");

    client.post("/api/chat", json!({ "message": "hi" })).await;
    assert_eq!(llm.prompts.lock().unwrap().last().unwrap(), "Be terse.");
}

#[tokio::test]
async fn transcripts_can_be_listed_viewed_and_deleted() {
    let mut client = Client::new();
    let (_, body) = client.post("/api/chat", json!({ "message": "hello" })).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();
    client.login().await;

    let (_, body) = client.get("/api/sessions").await;
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], session_id.as_str());
    assert_eq!(sessions[0]["message_count"], 2);

    let (status, body) = client.get(&format!("/api/sessions/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"][0]["message"], "hello");
    assert_eq!(body["messages"][1]["role"], "assistant");

    let (status, _) = client.delete(&format!("/api/sessions/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = client.get(&format!("/api/sessions/{session_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(client.state.chat.registry().history(&session_id).is_none());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut client = Client::build(Arc::new(StubLlm::default()), |config| {
        config.gateway.max_body_bytes = 64;
    });
    let message = "x".repeat(200);
    let (status, _) = client.post("/api/chat", json!({ "message": message })).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

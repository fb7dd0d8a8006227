#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use kbchat::chat::ChatService;
use kbchat::config::Config;
use kbchat::error::LlmError;
use kbchat::gateway::{AppState, build_app, build_gateway_state};
use kbchat::llm::{CompletionParams, LlmClient};
use kbchat::sessions::ChatMessage;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "s3cret";

#[derive(Default)]
pub struct StubLlm {
    pub fail: bool,
    pub prompts: Mutex<Vec<String>>,
    pub knowledge: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn complete(
        &self,
        history: &[ChatMessage],
        system_prompt: &str,
        knowledge_context: &str,
        _params: CompletionParams,
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(system_prompt.to_string());
        self.knowledge
            .lock()
            .unwrap()
            .push(knowledge_context.to_string());
        if self.fail {
            return Err(LlmError::Status {
                status: 503,
                detail: "Status 503".into(),
            });
        }
        let last = history.last().map_or("", |m| m.content.as_str());
        Ok(format!("echo: {last}"))
    }
}

pub struct Client {
    pub app: Router,
    pub state: AppState,
    pub cookie: Option<String>,
    _tmp: TempDir,
}

impl Client {
    pub fn with_llm(llm: Arc<StubLlm>) -> Self {
        Self::build(llm, |_| {})
    }

    pub fn build(llm: Arc<StubLlm>, tweak: impl FnOnce(&mut Config)) -> Self {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = tmp.path().join("data");
        config.admin.password = PASSWORD.into();
        config.admin.session_secret = Some("test-secret".into());
        tweak(&mut config);

        let chat = ChatService::from_config(&config, llm).unwrap();
        let state = build_gateway_state(&config, chat);
        Self {
            app: build_app(state.clone()),
            state,
            cookie: None,
            _tmp: tmp,
        }
    }

    pub fn new() -> Self {
        Self::with_llm(Arc::new(StubLlm::default()))
    }

    pub async fn send_request(&mut self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub fn request(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        let request = self.request(Method::GET, uri).body(Body::empty()).unwrap();
        self.send_request(request).await
    }

    pub async fn delete(&mut self, uri: &str) -> (StatusCode, Value) {
        let request = self
            .request(Method::DELETE, uri)
            .body(Body::empty())
            .unwrap();
        self.send_request(request).await
    }

    pub async fn send_json(&mut self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let body = body.to_string();
        let request = self
            .request(method, uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();
        self.send_request(request).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send_json(Method::POST, uri, body).await
    }

    pub async fn upload(&mut self, files: &[(&str, &str)]) -> (StatusCode, Value) {
        let mut body = String::new();
        for (name, content) in files {
            body.push_str(&format!(
                "--BOUNDARY\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str("--BOUNDARY--\r\n");
        let request = self
            .request(Method::POST, "/api/files/upload")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
            .body(Body::from(body))
            .unwrap();
        self.send_request(request).await
    }

    pub async fn login(&mut self) {
        let (status, body) = self
            .post("/api/admin/login", json!({ "password": PASSWORD }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
    }
}

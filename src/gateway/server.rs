use super::admin::{
    handle_delete_file, handle_delete_session, handle_get_file, handle_get_prompt,
    handle_get_session, handle_list_files, handle_list_sessions, handle_login, handle_logout,
    handle_status, handle_update_file, handle_update_prompt, handle_upload,
};
use super::handlers::{
    handle_chat, handle_health, handle_index, handle_new_session, handle_session_info,
};
use super::session::SessionKey;
use super::{AppState, REQUEST_TIMEOUT_SECS};

use crate::chat::ChatService;
use crate::config::Config;
use crate::llm::{ChatCompletionsClient, LlmClient};
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Bind `host:port` from config and serve until Ctrl-C.
pub async fn run_gateway(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid bind address {}:{}",
                config.gateway.host, config.gateway.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    run_gateway_with_listener(listener, config).await
}

/// Serve from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    let local_addr = listener.local_addr()?;

    let llm: Arc<dyn LlmClient> = Arc::new(ChatCompletionsClient::from_config(&config.llm));
    let chat = ChatService::from_config(&config, llm).context("open data directories")?;
    let state = build_gateway_state(&config, chat);

    warn_on_insecure_defaults(&config);
    print_gateway_banner(&local_addr.to_string(), &config);

    let app = build_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve HTTP gateway")?;

    tracing::info!("gateway stopped");
    Ok(())
}

pub fn build_gateway_state(config: &Config, chat: ChatService) -> AppState {
    AppState {
        chat: Arc::new(chat),
        admin_password: Arc::from(config.admin.password.as_str()),
        session_key: Arc::new(SessionKey::from_config(
            config.admin.session_secret.as_deref(),
        )),
        max_body_bytes: config.gateway.max_body_bytes,
    }
}

fn warn_on_insecure_defaults(config: &Config) {
    if config.admin.uses_default_password() {
        tracing::warn!("admin password is the built-in default; set KBCHAT_ADMIN_PASSWORD");
    }
    if config
        .admin
        .session_secret
        .as_deref()
        .is_none_or(|s| s.trim().is_empty())
    {
        tracing::warn!("no session secret configured; sessions will not survive a restart");
    }
    if config.llm.api_key.is_none() {
        tracing::warn!("LLM API key not set; chat replies will report a configuration error");
    }
}

fn print_gateway_banner(display_addr: &str, config: &Config) {
    println!("kbchat listening on http://{display_addr}");
    println!("  GET  /            -> chat UI");
    println!("  POST /api/chat");
    println!("  GET  /health");
    println!("  Knowledge base: {}", config.knowledge_dir().display());
    println!("  Session logs:   {}", config.sessions_dir().display());
    println!("  Model:          {}", config.llm.model);
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

/// All routes with body-limit and timeout layers applied.
pub fn build_app(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/chat", post(handle_chat))
        .route("/api/session/new", post(handle_new_session))
        .route("/api/session/info", get(handle_session_info))
        .route("/api/admin/login", post(handle_login))
        .route("/api/admin/logout", post(handle_logout))
        .route("/api/admin/status", get(handle_status))
        .route("/api/files", get(handle_list_files))
        .route("/api/files/upload", post(handle_upload))
        .route(
            "/api/files/{name}",
            get(handle_get_file)
                .put(handle_update_file)
                .delete(handle_delete_file),
        )
        .route("/api/sessions", get(handle_list_sessions))
        .route(
            "/api/sessions/{id}",
            get(handle_get_session).delete(handle_delete_session),
        )
        .route(
            "/api/system-prompt",
            get(handle_get_prompt).put(handle_update_prompt),
        )
        .with_state(state)
        // Uploads are bounded by the configured limit, not axum's 2 MB default.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

use super::AppState;
use super::error::ApiError;
use super::session::WebSession;
use crate::sessions::ChatMessage;
use axum::{
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{Html, IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

const INDEX_HTML: &str = include_str!("ui/index.html");

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: String,
    pub llm_error: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub history: Vec<ChatMessage>,
}

/// Attach the re-signed session cookie to `body`.
pub(super) fn with_session(
    state: &AppState,
    session: &WebSession,
    body: impl IntoResponse,
) -> Response {
    (
        [(header::SET_COOKIE, state.session_key.set_cookie(session))],
        body,
    )
        .into_response()
}

/// GET /: embedded single-page UI
pub(super) async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health: always public
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /api/chat: one chat turn for the caller's session
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    mut session: WebSession,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Empty message".into()));
    }

    let session_id = session.ensure_sid();
    let outcome = state.chat.chat(&session_id, &request.message).await?;

    Ok(with_session(
        &state,
        &session,
        Json(ChatResponse {
            reply: outcome.reply,
            session_id,
            llm_error: outcome.llm_error,
        }),
    ))
}

/// POST /api/session/new: drop current history, start a new id
pub(super) async fn handle_new_session(
    State(state): State<AppState>,
    mut session: WebSession,
) -> Response {
    let old = session.sid.take();
    let session_id = state.chat.reset_session(old.as_deref());
    session.sid = Some(session_id.clone());

    with_session(
        &state,
        &session,
        Json(serde_json::json!({ "session_id": session_id })),
    )
}

/// GET /api/session/info: current id and its history. Read-only; the id is
/// only registered once it chats.
pub(super) async fn handle_session_info(
    State(state): State<AppState>,
    mut session: WebSession,
) -> Response {
    let session_id = session.ensure_sid();
    let history = state.chat.session_history(&session_id);

    with_session(
        &state,
        &session,
        Json(SessionInfo {
            session_id,
            history,
        }),
    )
}

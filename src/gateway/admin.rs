//! Admin endpoints: login state, knowledge documents, transcripts and the
//! system prompt. Everything except login/logout/status needs [`AdminSession`].

use super::AppState;
use super::error::ApiError;
use super::handlers::with_session;
use super::session::{AdminSession, WebSession};
use crate::knowledge::{UploadedFile, is_allowed_upload, sanitize_filename};
use axum::{
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct FileUpdate {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptUpdate {
    pub prompt: Option<String>,
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn success() -> Json<serde_json::Value> {
    Json(json!({ "success": true }))
}

// ── Login state ──────────────────────────────────────────────

/// POST /api/admin/login
pub(super) async fn handle_login(
    State(state): State<AppState>,
    mut session: WebSession,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;

    if constant_time_eq(&request.password, &state.admin_password) {
        session.is_admin = true;
        tracing::info!("admin login");
        Ok(with_session(&state, &session, success()))
    } else {
        tracing::warn!("admin login failed: wrong password");
        Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false })),
        )
            .into_response())
    }
}

/// POST /api/admin/logout
pub(super) async fn handle_logout(
    State(state): State<AppState>,
    mut session: WebSession,
) -> Response {
    session.is_admin = false;
    with_session(&state, &session, success())
}

/// GET /api/admin/status
pub(super) async fn handle_status(session: WebSession) -> impl IntoResponse {
    Json(json!({ "is_admin": session.is_admin }))
}

// ── Knowledge documents ──────────────────────────────────────

pub(super) async fn handle_list_files(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let files = state.chat.documents().list()?;
    Ok(Json(json!({ "files": files })))
}

/// POST /api/files/upload: multipart, repeatable `file` field.
/// Names are sanitized first; files whose clean name lacks an allowed
/// extension are skipped.
pub(super) async fn handle_upload(
    _admin: AdminSession,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut accepted = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().and_then(sanitize_filename);
        if !file_name.as_deref().is_some_and(is_allowed_upload) {
            tracing::debug!(
                raw = ?field.file_name(),
                file_name = ?file_name,
                "upload skipped: extension not allowed"
            );
            continue;
        }
        let bytes = field.bytes().await?;
        accepted.push(UploadedFile {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    let uploaded = state.chat.documents().upload(accepted)?;
    if uploaded.is_empty() {
        return Err(ApiError::BadRequest("No valid files uploaded".into()));
    }
    tracing::info!(count = uploaded.len(), "documents uploaded");
    Ok(Json(json!({ "uploaded": uploaded })))
}

pub(super) async fn handle_get_file(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, content) = state.chat.documents().read(&name)?;
    Ok(Json(json!({ "name": name, "content": content })))
}

/// PUT /api/files/{name}: replace an existing document only.
pub(super) async fn handle_update_file(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<FileUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(update) = body?;
    let documents = state.chat.documents();
    if !documents.exists(&name) {
        return Err(ApiError::NotFound(format!("Not found: {name}")));
    }
    let saved = documents.write(&name, &update.content)?;
    tracing::info!(name = %saved, bytes = update.content.len(), "document updated");
    Ok(success())
}

pub(super) async fn handle_delete_file(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.chat.documents().delete(&name)?;
    tracing::info!(name = %name, "document deleted");
    Ok(success())
}

// ── Transcripts ──────────────────────────────────────────────

pub(super) async fn handle_list_sessions(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.chat.transcripts()?;
    Ok(Json(json!({ "sessions": sessions })))
}

pub(super) async fn handle_get_session(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state.chat.transcript(&session_id)?;
    Ok(Json(json!({ "session_id": session_id, "messages": messages })))
}

pub(super) async fn handle_delete_session(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.chat.delete_transcript(&session_id)?;
    Ok(success())
}

// ── System prompt ────────────────────────────────────────────

pub(super) async fn handle_get_prompt(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> impl IntoResponse {
    Json(json!({ "prompt": state.chat.system_prompt() }))
}

/// PUT /api/system-prompt: a missing `prompt` keeps the current one.
pub(super) async fn handle_update_prompt(
    _admin: AdminSession,
    State(state): State<AppState>,
    body: Result<Json<PromptUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(update) = body?;
    if let Some(prompt) = update.prompt {
        state.chat.set_system_prompt(prompt);
    }
    Ok(success())
}

//! Axum HTTP gateway: the chat API, the admin API and the embedded UI.
//!
//! - Request bodies are capped at `gateway.max_body_bytes` (uploads included)
//! - Requests time out after [`REQUEST_TIMEOUT_SECS`], above the LLM timeout
//! - Browser state lives in a signed cookie (see [`session`])

mod admin;
mod error;
mod handlers;
mod server;
pub mod session;

pub use error::ApiError;
pub use server::{build_app, build_gateway_state, run_gateway, run_gateway_with_listener};
pub use session::{SESSION_COOKIE, SessionKey, WebSession};

use crate::chat::ChatService;
use std::sync::Arc;

/// Request timeout (150s); must exceed the 120s LLM call timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 150;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub admin_password: Arc<str>,
    pub session_key: Arc<SessionKey>,
    pub max_body_bytes: usize,
}

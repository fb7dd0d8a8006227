//! Signed cookie carrying the browser's chat session id and admin flag.
//!
//! Cookie value: `hex(json payload) "." hex(hmac_sha256(key, json payload))`.
//! Anything that fails to parse or verify is treated as an empty session.

use super::AppState;
use super::error::ApiError;
use crate::sessions::new_session_id;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::convert::Infallible;

pub const SESSION_COOKIE: &str = "kbchat_session";

type HmacSha256 = Hmac<Sha256>;

/// Key used to sign and verify session cookies.
pub struct SessionKey {
    key: Vec<u8>,
}

impl SessionKey {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: secret.to_vec(),
        }
    }

    /// Per-process key; cookies signed with it die with the process.
    pub fn random() -> Self {
        let mut key = Vec::with_capacity(32);
        key.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        key.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        Self { key }
    }

    /// Configured secret if set and non-blank, otherwise [`SessionKey::random`].
    pub fn from_config(secret: Option<&str>) -> Self {
        match secret.map(str::trim).filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret.as_bytes()),
            None => Self::random(),
        }
    }

    fn mac(&self, payload: &[u8]) -> Option<HmacSha256> {
        let Ok(mut mac) = <HmacSha256 as Mac>::new_from_slice(&self.key) else {
            return None;
        };
        mac.update(payload);
        Some(mac)
    }

    pub fn sign(&self, session: &WebSession) -> String {
        let payload = serde_json::to_vec(session).unwrap_or_default();
        // An empty tag never verifies.
        let tag = self
            .mac(&payload)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default();
        format!("{}.{tag}", hex::encode(&payload))
    }

    /// Decode a cookie value. `None` when malformed or the tag does not match.
    pub fn verify(&self, value: &str) -> Option<WebSession> {
        let (payload_hex, tag_hex) = value.split_once('.')?;
        let payload = hex::decode(payload_hex).ok()?;
        let tag = hex::decode(tag_hex).ok()?;
        // Constant-time comparison
        self.mac(&payload)?.verify_slice(&tag).ok()?;
        serde_json::from_slice(&payload).ok()
    }

    /// Full `Set-Cookie` header value for `session`.
    pub fn set_cookie(&self, session: &WebSession) -> String {
        format!(
            "{SESSION_COOKIE}={}; HttpOnly; SameSite=Lax; Path=/",
            self.sign(session)
        )
    }
}

/// Per-browser state stored in the signed cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl WebSession {
    /// Current chat session id, assigning a fresh one if the cookie had none.
    pub fn ensure_sid(&mut self) -> String {
        self.sid.get_or_insert_with(new_session_id).clone()
    }
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find_map(|(k, v)| (k == name).then_some(v))
}

impl FromRequestParts<AppState> for WebSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = cookie_value(&parts.headers, SESSION_COOKIE)
            .and_then(|value| state.session_key.verify(value));
        if session.is_none() && parts.headers.contains_key(header::COOKIE) {
            tracing::debug!("no valid session cookie; starting empty session");
        }
        Ok(session.unwrap_or_default())
    }
}

/// Extractor that only succeeds when the session carries the admin flag.
pub struct AdminSession(pub WebSession);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(session) = WebSession::from_request_parts(parts, state).await;
        if session.is_admin {
            Ok(Self(session))
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

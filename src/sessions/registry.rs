use super::types::{ChatMessage, MessageRole};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Length of generated session ids (hex chars).
pub const SESSION_ID_LEN: usize = 12;

/// Fresh opaque session token: the first 12 hex chars of a v4 UUID.
pub fn new_session_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(SESSION_ID_LEN);
    id
}

/// Process-lifetime map from session id to ordered history.
///
/// A single mutex guards the whole map. Each method is atomic on its own;
/// a chat turn spans several calls, so concurrent turns on the same session
/// may interleave.
#[derive(Debug, Default)]
pub struct ChatRegistry {
    sessions: Mutex<HashMap<String, Vec<ChatMessage>>>,
}

impl ChatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<ChatMessage>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    /// History for `session_id`, registering an empty one if unknown.
    pub fn get_or_create(&self, session_id: &str) -> Vec<ChatMessage> {
        self.lock()
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Like [`ChatRegistry::get_or_create`], seeding an unknown session from `seed`.
    pub fn get_or_insert_with(
        &self,
        session_id: &str,
        seed: impl FnOnce() -> Vec<ChatMessage>,
    ) -> Vec<ChatMessage> {
        self.lock()
            .entry(session_id.to_string())
            .or_insert_with(seed)
            .clone()
    }

    /// History without registering anything.
    pub fn history(&self, session_id: &str) -> Option<Vec<ChatMessage>> {
        self.lock().get(session_id).cloned()
    }

    /// Append one message and return the history as it stands afterwards.
    pub fn append(&self, session_id: &str, role: MessageRole, content: &str) -> Vec<ChatMessage> {
        let mut sessions = self.lock();
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(ChatMessage {
            role,
            content: content.to_string(),
        });
        history.clone()
    }

    /// Drop `old` (if any) and register a fresh empty session.
    pub fn reset(&self, old: Option<&str>) -> String {
        let mut sessions = self.lock();
        if let Some(old) = old {
            sessions.remove(old);
        }
        let mut id = new_session_id();
        while sessions.contains_key(&id) || Some(id.as_str()) == old {
            id = new_session_id();
        }
        sessions.insert(id.clone(), Vec::new());
        id
    }

    /// Evict a session. Returns whether it was present.
    pub fn remove(&self, session_id: &str) -> bool {
        self.lock().remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

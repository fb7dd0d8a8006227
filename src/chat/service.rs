use crate::config::Config;
use crate::error::{KbError, LlmError, StoreError};
use crate::knowledge::{self, DocumentStore};
use crate::llm::{sanitize_for_log, CompletionParams, LlmClient};
use crate::sessions::{ChatMessage, ChatRegistry, LogRecord, LogSummary, MessageRole, SessionLog};
use std::sync::{Arc, PoisonError, RwLock};

/// Prefix of the assistant text that stands in for a failed completion.
pub const LLM_FAILURE_PREFIX: &str = "Error connecting to AI service.";

/// Result of one chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    /// Assistant text as stored and displayed. On upstream failure this is
    /// the rendered error.
    pub reply: String,
    /// True when `reply` is a rendered upstream failure.
    pub llm_error: bool,
}

/// Text recorded as the assistant turn when the completion call fails.
pub fn render_llm_failure(error: &LlmError) -> String {
    format!("{LLM_FAILURE_PREFIX} ({error})")
}

/// Everything a request handler needs: the registry, transcript log,
/// document store, LLM client and the live system prompt.
///
/// The registry is one mutex-guarded map and the prompt sits behind an
/// `RwLock`; neither lock is held across the completion call.
pub struct ChatService {
    registry: ChatRegistry,
    log: SessionLog,
    documents: DocumentStore,
    llm: Arc<dyn LlmClient>,
    system_prompt: RwLock<String>,
    params: CompletionParams,
    rehydrate_from_log: bool,
}

impl ChatService {
    pub fn new(
        documents: DocumentStore,
        log: SessionLog,
        llm: Arc<dyn LlmClient>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            registry: ChatRegistry::new(),
            log,
            documents,
            llm,
            system_prompt: RwLock::new(system_prompt.into()),
            params: CompletionParams::default(),
            rehydrate_from_log: true,
        }
    }

    /// Open the stores under `config.data_dir` and wire in `llm`.
    pub fn from_config(config: &Config, llm: Arc<dyn LlmClient>) -> Result<Self, StoreError> {
        let documents = DocumentStore::open(config.knowledge_dir())?;
        let log = SessionLog::open(config.sessions_dir())?;
        Ok(Self::new(documents, log, llm, config.assistant.system_prompt.clone())
            .with_params(CompletionParams {
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
            })
            .with_rehydration(config.sessions.rehydrate_from_log))
    }

    pub fn with_params(mut self, params: CompletionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_rehydration(mut self, enabled: bool) -> Self {
        self.rehydrate_from_log = enabled;
        self
    }

    pub fn registry(&self) -> &ChatRegistry {
        &self.registry
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    // ── System prompt ────────────────────────────────────────────

    pub fn system_prompt(&self) -> String {
        self.system_prompt
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_system_prompt(&self, prompt: String) {
        *self
            .system_prompt
            .write()
            .unwrap_or_else(PoisonError::into_inner) = prompt;
        tracing::info!("system prompt updated");
    }

    // ── Sessions ─────────────────────────────────────────────────

    /// History for `session_id`, registering the session if needed. With
    /// rehydration on, an id unknown to the registry but present in the
    /// transcript log is seeded from the log.
    pub fn ensure_session(&self, session_id: &str) -> Vec<ChatMessage> {
        if !self.rehydrate_from_log || self.registry.contains(session_id) {
            return self.registry.get_or_create(session_id);
        }
        let seed = self.history_from_log(session_id);
        self.registry.get_or_insert_with(session_id, || seed)
    }

    /// Read-only counterpart of [`Self::ensure_session`]: the registry is
    /// never modified, so unknown ids cost nothing.
    pub fn session_history(&self, session_id: &str) -> Vec<ChatMessage> {
        if let Some(history) = self.registry.history(session_id) {
            return history;
        }
        if self.rehydrate_from_log {
            self.history_from_log(session_id)
        } else {
            Vec::new()
        }
    }

    fn history_from_log(&self, session_id: &str) -> Vec<ChatMessage> {
        match self.log.read(session_id) {
            Ok(records) => {
                if !records.is_empty() {
                    tracing::info!(
                        session_id,
                        messages = records.len(),
                        "rehydrated session history from transcript"
                    );
                }
                records.into_iter().map(ChatMessage::from).collect()
            }
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => {
                tracing::warn!(session_id, error = %e, "transcript unreadable; starting empty");
                Vec::new()
            }
        }
    }

    /// Drop the caller's current history and hand out a fresh id.
    pub fn reset_session(&self, old: Option<&str>) -> String {
        let id = self.registry.reset(old);
        tracing::info!(old = old.unwrap_or("-"), new = %id, "session reset");
        id
    }

    // ── Chat ─────────────────────────────────────────────────────

    /// Run one turn: record the user message, call the LLM with the current
    /// knowledge base, record and return the reply.
    ///
    /// Once the user message is recorded the rest of the turn runs on its
    /// own task, so dropping the returned future never leaves a turn
    /// without its assistant record.
    ///
    /// Upstream failures are not errors here; they come back as a rendered
    /// reply with `llm_error` set, and are recorded like any other reply.
    pub async fn chat(
        self: &Arc<Self>,
        session_id: &str,
        message: &str,
    ) -> Result<ChatOutcome, KbError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(KbError::Validation("Empty message".into()));
        }

        self.ensure_session(session_id);
        let history = self.registry.append(session_id, MessageRole::User, message);
        self.log.append(session_id, MessageRole::User, message)?;
        tracing::info!(
            session_id,
            turns = history.len(),
            message_chars = message.chars().count(),
            "chat turn"
        );

        let service = Arc::clone(self);
        let session_id = session_id.to_string();
        tokio::spawn(async move { service.finish_turn(&session_id, history).await })
            .await
            .map_err(|e| KbError::Other(anyhow::anyhow!("chat turn task failed: {e}")))?
    }

    async fn finish_turn(
        &self,
        session_id: &str,
        history: Vec<ChatMessage>,
    ) -> Result<ChatOutcome, KbError> {
        let knowledge = knowledge::build_context(&self.documents);
        let system_prompt = self.system_prompt();
        tracing::debug!(session_id, knowledge_chars = knowledge.len(), "calling LLM");

        let outcome = match self
            .llm
            .complete(&history, &system_prompt, &knowledge, self.params)
            .await
        {
            Ok(reply) => ChatOutcome {
                reply,
                llm_error: false,
            },
            Err(e) => {
                tracing::error!(
                    session_id,
                    error = %sanitize_for_log(&e.to_string(), self.llm.secret()),
                    "LLM request failed"
                );
                ChatOutcome {
                    reply: render_llm_failure(&e),
                    llm_error: true,
                }
            }
        };

        self.registry
            .append(session_id, MessageRole::Assistant, &outcome.reply);
        self.log
            .append(session_id, MessageRole::Assistant, &outcome.reply)?;
        Ok(outcome)
    }

    // ── Knowledge ────────────────────────────────────────────────

    pub fn knowledge_context(&self) -> String {
        knowledge::build_context(&self.documents)
    }

    // ── Transcripts ──────────────────────────────────────────────

    pub fn transcripts(&self) -> Result<Vec<LogSummary>, StoreError> {
        self.log.list()
    }

    pub fn transcript(&self, session_id: &str) -> Result<Vec<LogRecord>, StoreError> {
        self.log.read(session_id)
    }

    /// Remove the transcript and evict the in-memory history. Idempotent.
    ///
    /// Ids that are not already in the log's file-name form are rejected, so
    /// the file removed and the history evicted always belong to one session.
    pub fn delete_transcript(&self, session_id: &str) -> Result<(), StoreError> {
        if knowledge::sanitize_filename(session_id).as_deref() != Some(session_id) {
            return Err(StoreError::InvalidName(session_id.to_string()));
        }
        let removed_file = self.log.delete(session_id)?;
        let evicted = self.registry.remove(session_id);
        tracing::info!(session_id, removed_file, evicted, "session transcript deleted");
        Ok(())
    }
}

use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `kbchat`.
///
/// Each subsystem defines its own error variant. The gateway matches on these
/// to pick a status code; the binary continues to use `anyhow::Result` for
/// ad-hoc context chains.
#[derive(Debug, Error)]
pub enum KbError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Storage (documents, session logs) ───────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── LLM ─────────────────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Request validation ──────────────────────────────────────────────
    #[error("invalid request: {0}")]
    Validation(String),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Storage errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ─── LLM errors ──────────────────────────────────────────────────────────────

/// Failure of a single chat-completion call.
///
/// The `Display` text is what ends up embedded in the assistant bubble, so it
/// carries the upstream status and body when one was received.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status} | {detail}")]
    Status { status: u16, detail: String },

    #[error("response JSON decode failed: {0}")]
    Decode(String),

    #[error("response contained no message content")]
    EmptyReply,

    #[error("API key not set; configure llm.api_key or KBCHAT_LLM_API_KEY")]
    MissingApiKey,
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, KbError>;

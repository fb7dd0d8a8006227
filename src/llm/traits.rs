use crate::error::LlmError;
use crate::sessions::ChatMessage;
use async_trait::async_trait;

pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Per-call sampling knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One non-streaming completion over the full history (oldest first).
    ///
    /// The system prompt and knowledge context are merged into a single
    /// system message by the implementation.
    async fn complete(
        &self,
        history: &[ChatMessage],
        system_prompt: &str,
        knowledge_context: &str,
        params: CompletionParams,
    ) -> Result<String, LlmError>;

    /// Key to redact from logged errors, if any.
    fn secret(&self) -> Option<&str> {
        None
    }
}

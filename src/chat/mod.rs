pub mod service;

pub use service::{render_llm_failure, ChatOutcome, ChatService, LLM_FAILURE_PREFIX};

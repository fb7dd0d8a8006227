// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod prompt;
pub mod scrub;
pub mod traits;

// ── Endpoint implementation ─────────────────────────────────────────────────
pub mod client;

pub use client::ChatCompletionsClient;
pub use prompt::build_system_message;
pub use scrub::{redact_secrets, sanitize_for_log};
pub use traits::{CompletionParams, LlmClient};

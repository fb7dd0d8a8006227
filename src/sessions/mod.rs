pub mod log;
pub mod registry;
pub mod types;

pub use log::SessionLog;
pub use registry::{new_session_id, ChatRegistry};
pub use types::{ChatMessage, LogRecord, LogSummary, MessageRole};

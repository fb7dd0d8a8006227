pub mod schema;

pub use schema::{
    AdminConfig, AssistantConfig, Config, GatewayConfig, LlmConfig, SessionsConfig,
    DEFAULT_SYSTEM_PROMPT,
};

use reqwest::Client;
use std::time::Duration;

/// Upper bound on one chat-completion round trip.
pub const LLM_TIMEOUT_SECS: u64 = 120;
pub const LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

pub fn build_llm_client() -> Client {
    build_llm_client_with_timeout(LLM_TIMEOUT_SECS)
}

pub fn build_llm_client_with_timeout(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(LLM_CONNECT_TIMEOUT_SECS))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}

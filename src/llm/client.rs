use super::http_client::build_llm_client;
use super::prompt::build_system_message;
use super::traits::{CompletionParams, LlmClient};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::sessions::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;

const MAX_PLAIN_BODY_CHARS: usize = 500;

/// Client for an OpenAI-style `/models/chat/completions` endpoint as exposed
/// by Azure AI Foundry deployments.
pub struct ChatCompletionsClient {
    endpoint: String,
    api_version: String,
    model: String,
    api_key: Option<String>,
    /// Pre-computed `"Bearer <key>"` header value (avoids `format!` per request).
    cached_auth_header: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(
        endpoint: &str,
        api_key: Option<&str>,
        model: &str,
        api_version: &str,
    ) -> Self {
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            model: model.to_string(),
            api_key: api_key.map(str::to_string),
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            client: build_llm_client(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            &config.endpoint,
            config.api_key.as_deref(),
            &config.model,
            &config.api_version,
        )
    }

    fn url(&self) -> String {
        format!("{}/models/chat/completions", self.endpoint)
    }

    fn build_request<'a>(
        model: &'a str,
        system_message: &'a str,
        history: &'a [ChatMessage],
        params: CompletionParams,
    ) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: system_message,
        });
        messages.extend(history.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        ChatRequest {
            model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        }
    }

    fn extract_text(response: ChatResponse) -> Result<String, LlmError> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyReply)
    }

    /// Describe a non-2xx response: compact JSON when the body is JSON,
    /// otherwise the (truncated) body text, otherwise just the status.
    fn status_detail(status: u16, body: &str) -> String {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            return json.to_string();
        }
        let trimmed = body.trim();
        if trimmed.is_empty() {
            format!("Status {status}")
        } else {
            super::scrub::truncate_chars(trimmed, MAX_PLAIN_BODY_CHARS)
        }
    }
}

/// `Display` of an error plus its source chain, joined with `: `.
fn error_chain(error: &dyn StdError) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(
        &self,
        history: &[ChatMessage],
        system_prompt: &str,
        knowledge_context: &str,
        params: CompletionParams,
    ) -> Result<String, LlmError> {
        let auth_header = self
            .cached_auth_header
            .as_ref()
            .ok_or(LlmError::MissingApiKey)?;

        let system_message = build_system_message(system_prompt, knowledge_context);
        let request = Self::build_request(&self.model, &system_message, history, params);

        let response = self
            .client
            .post(self.url())
            .query(&[("api-version", self.api_version.as_str())])
            .header("Authorization", auth_header)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(error_chain(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                detail: Self::status_detail(status.as_u16(), &body),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(error_chain(&e)))?;
        Self::extract_text(parsed)
    }

    fn secret(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

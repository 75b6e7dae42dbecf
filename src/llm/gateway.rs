//! Chat-completion request/response plumbing, provider-agnostic at the
//! call site. Distinguishes the four failure modes spec.md §4.4 names:
//! transport/timeout, HTTP non-2xx, 2xx-but-missing-content, and
//! 2xx-with-blank-content — the last two both surface as `EmptyContent`
//! since the orchestrator treats both as "skip this point", but blank
//! content is additionally logged at WARN with the finish reason.

use crate::core::config::ApiConfig;
use crate::core::errors::sanitize_error;
use crate::llm::adapters::{self, ProviderAdapter};
use crate::llm::ProviderKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

pub struct LlmReply {
    pub content: String,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned an error response")]
    HttpStatus { status: u16, sanitized: String },
    #[error("response contained no content")]
    EmptyContent,
}

pub struct LlmGateway {
    client: reqwest::Client,
}

impl LlmGateway {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Call the configured provider with `messages`, honoring `timeout` and
    /// `max_tokens`. Never retries — the caller (Worker Loop) decides what
    /// a failed/empty call means for the point it's processing.
    pub async fn complete(
        &self,
        config: &ApiConfig,
        messages: &[ChatMessage],
        max_tokens: u32,
        timeout: Duration,
        use_final_model: bool,
    ) -> Result<LlmReply, GatewayError> {
        let adapter: Box<dyn ProviderAdapter> = match config.provider {
            ProviderKind::OpenAiCompatible => Box::new(adapters::openai::OpenAiAdapter),
            ProviderKind::AnthropicNative => Box::new(adapters::anthropic::AnthropicAdapter),
        };

        let model = if use_final_model { &config.final_model } else { &config.work_model };
        let request = adapter.build_request(config, messages, model, max_tokens);

        let send = self.client.post(&request.url).headers(request.headers).json(&request.body).send();

        let response = match tokio::time::timeout(timeout, send).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Err(GatewayError::Transport(sanitize_error(&e.to_string()))),
            Err(_) => return Err(GatewayError::Timeout),
        };

        let status = response.status();
        let body_text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(GatewayError::HttpStatus {
                status: status.as_u16(),
                sanitized: sanitize_error(&body_text),
            });
        }

        let parsed: serde_json::Value = match serde_json::from_str(&body_text) {
            Ok(v) => v,
            Err(_) => return Err(GatewayError::EmptyContent),
        };

        let (content, finish_reason) = adapter.parse_response(&parsed);
        let Some(content) = content else {
            return Err(GatewayError::EmptyContent);
        };

        if content.trim().is_empty() {
            tracing::warn!(
                "LLM returned blank content, finish_reason={:?}",
                finish_reason
            );
            return Err(GatewayError::EmptyContent);
        }

        Ok(LlmReply { content, finish_reason })
    }
}

pub(crate) fn role_str(role: Role) -> &'static str {
    role.as_str()
}

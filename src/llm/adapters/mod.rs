//! Per-provider request construction and response parsing.

pub mod anthropic;
pub mod openai;

use crate::core::config::ApiConfig;
use crate::llm::gateway::ChatMessage;
use reqwest::header::HeaderMap;

pub struct ProviderRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

pub trait ProviderAdapter: Send + Sync {
    fn build_request(
        &self,
        config: &ApiConfig,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> ProviderRequest;

    /// Returns `(content, finish_reason)`. `content` is `None` when the
    /// 2xx body lacks the expected `choices`/`content` shape entirely.
    fn parse_response(&self, body: &serde_json::Value) -> (Option<String>, Option<String>);
}

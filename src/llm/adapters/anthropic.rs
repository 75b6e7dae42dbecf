//! Anthropic-native adapter — spec.md §4.4: extract the `system`-role
//! message into a top-level field, submit remaining messages in order,
//! parse `content[0].text`.

use super::{ProviderAdapter, ProviderRequest};
use crate::core::config::ApiConfig;
use crate::llm::gateway::{role_str, ChatMessage, Role};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::json;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter;

impl ProviderAdapter for AnthropicAdapter {
    fn build_request(
        &self,
        config: &ApiConfig,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> ProviderRequest {
        let system: Option<String> = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone());

        let rest: Vec<_> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| json!({ "role": role_str(m.role), "content": m.content }))
            .collect();

        let mut body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": rest,
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(v) = HeaderValue::from_str(&config.api_key) {
            headers.insert("x-api-key", v);
        }
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));

        let base = config.base_url.trim_end_matches('/');
        ProviderRequest {
            url: format!("{base}/messages"),
            headers,
            body,
        }
    }

    fn parse_response(&self, body: &serde_json::Value) -> (Option<String>, Option<String>) {
        let content = body
            .get("content")
            .and_then(|c| c.as_array())
            .and_then(|a| a.first())
            .and_then(|b| b.get("text"))
            .and_then(|t| t.as_str())
            .map(|s| s.to_string());
        let finish_reason = body
            .get("stop_reason")
            .and_then(|r| r.as_str())
            .map(|s| s.to_string());
        (content, finish_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_system_message_into_top_level_field() {
        let adapter = AnthropicAdapter;
        let config = ApiConfig {
            provider: crate::llm::ProviderKind::AnthropicNative,
            base_url: "https://api.anthropic.com/v1".to_string(),
            api_key: "key".to_string(),
            work_model: "claude".to_string(),
            final_model: "claude".to_string(),
            language: crate::core::types::Language::En,
        };
        let messages = vec![ChatMessage::system("be terse"), ChatMessage::user("hi")];
        let req = adapter.build_request(&config, &messages, "claude", 100);
        assert_eq!(req.body["system"], json!("be terse"));
        assert_eq!(req.body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn parses_content_array_first_text_block() {
        let adapter = AnthropicAdapter;
        let body = json!({"content": [{"type": "text", "text": "answer"}], "stop_reason": "end_turn"});
        let (content, reason) = adapter.parse_response(&body);
        assert_eq!(content.as_deref(), Some("answer"));
        assert_eq!(reason.as_deref(), Some("end_turn"));
    }
}

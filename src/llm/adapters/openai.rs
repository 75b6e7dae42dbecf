//! OpenAI-compatible adapter (OpenRouter, OpenAI, Google's OpenAI-shaped
//! endpoint, HuggingFace Inference) — spec.md §4.4: submit all messages
//! as-is plus `temperature = 0.3`, parse `choices[0].message.content`.

use super::{ProviderAdapter, ProviderRequest};
use crate::core::config::ApiConfig;
use crate::llm::gateway::{role_str, ChatMessage};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;

/// Google's Gemini OpenAI-compatibility layer additionally wants the key
/// on `x-goog-api-key` (spec.md:292) on top of the usual bearer token.
fn is_google_endpoint(base_url: &str) -> bool {
    base_url.contains("generativelanguage.googleapis.com")
}

pub struct OpenAiAdapter;

impl ProviderAdapter for OpenAiAdapter {
    fn build_request(
        &self,
        config: &ApiConfig,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> ProviderRequest {
        let body = json!({
            "model": model,
            "messages": messages.iter().map(|m| json!({
                "role": role_str(m.role),
                "content": m.content,
            })).collect::<Vec<_>>(),
            "max_tokens": max_tokens,
            "temperature": 0.3,
        });

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(v) = HeaderValue::from_str(&format!("Bearer {}", config.api_key)) {
            headers.insert(AUTHORIZATION, v);
        }
        if is_google_endpoint(&config.base_url) {
            if let Ok(v) = HeaderValue::from_str(&config.api_key) {
                headers.insert(HeaderName::from_static("x-goog-api-key"), v);
            }
        }

        let base = config.base_url.trim_end_matches('/');
        ProviderRequest {
            url: format!("{base}/chat/completions"),
            headers,
            body,
        }
    }

    fn parse_response(&self, body: &serde_json::Value) -> (Option<String>, Option<String>) {
        let choice = body.get("choices").and_then(|c| c.as_array()).and_then(|a| a.first());
        let content = choice
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string());
        let finish_reason = choice
            .and_then(|c| c.get("finish_reason"))
            .and_then(|f| f.as_str())
            .map(|s| s.to_string());
        (content, finish_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_choice_shape() {
        let adapter = OpenAiAdapter;
        let body = json!({
            "choices": [{"message": {"content": "hello"}, "finish_reason": "stop"}]
        });
        let (content, reason) = adapter.parse_response(&body);
        assert_eq!(content.as_deref(), Some("hello"));
        assert_eq!(reason.as_deref(), Some("stop"));
    }

    #[test]
    fn missing_choices_yields_none() {
        let adapter = OpenAiAdapter;
        let (content, _) = adapter.parse_response(&json!({}));
        assert!(content.is_none());
    }

    fn test_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            provider: crate::llm::ProviderKind::OpenAiCompatible,
            base_url: base_url.to_string(),
            api_key: "sk-test".to_string(),
            work_model: "gpt-4o-mini".to_string(),
            final_model: "gpt-4o".to_string(),
            language: crate::core::types::Language::En,
        }
    }

    #[test]
    fn google_endpoint_gets_x_goog_api_key_header() {
        let adapter = OpenAiAdapter;
        let config = test_config("https://generativelanguage.googleapis.com/v1beta/openai");
        let req = adapter.build_request(&config, &[], "gemini-2.0-flash", 1000);
        assert_eq!(req.headers.get("x-goog-api-key").unwrap(), "sk-test");
        assert!(req.headers.get(AUTHORIZATION).is_some());
    }

    #[test]
    fn non_google_endpoint_has_no_goog_header() {
        let adapter = OpenAiAdapter;
        let config = test_config("https://openrouter.ai/api/v1");
        let req = adapter.build_request(&config, &[], "gpt-4o-mini", 1000);
        assert!(req.headers.get("x-goog-api-key").is_none());
    }
}

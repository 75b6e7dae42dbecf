//! Typed error taxonomy for boundary-crossing calls (spec.md §7).
//!
//! Leaf helpers (HTML parsing, HTTP plumbing) keep using `anyhow::Result`,
//! matching the teacher's own idiom; this enum exists at the edges the
//! orchestrator branches on (LLM Gateway, Worker Loop, HTTP handlers), where
//! a generic `anyhow::Error` would lose the classification spec.md demands.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("upstream returned non-2xx: {0}")]
    HttpStatus(String),

    #[error("empty content from provider")]
    EmptyContent,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// All outward-facing error strings pass through this sanitizer first
/// (spec.md §7 "Secrets and PII"). Internal errors are reduced to a
/// generic message; nothing upstream is ever echoed verbatim.
impl IntoResponse for OrchestratorError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            OrchestratorError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            OrchestratorError::Timeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                "upstream request timed out".to_string(),
            ),
            OrchestratorError::Transport(_) | OrchestratorError::HttpStatus(_) => (
                StatusCode::BAD_GATEWAY,
                "upstream request failed".to_string(),
            ),
            OrchestratorError::EmptyContent => (
                StatusCode::BAD_GATEWAY,
                "provider returned no content".to_string(),
            ),
            OrchestratorError::Internal(e) => {
                tracing::error!("internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Redact API-key-shaped tokens, bearer headers, absolute paths, and
/// password-like patterns from an error string before it leaves the
/// process (spec.md §4.4, §7). Truncates to 500 chars.
pub fn sanitize_error(raw: &str) -> String {
    let mut s = raw.to_string();

    let patterns: &[(&str, &str)] = &[
        (r"sk-[A-Za-z0-9]{10,}", "[REDACTED_KEY]"),
        (r"(?i)bearer\s+[A-Za-z0-9._\-]+", "Bearer [REDACTED]"),
        (r"(?i)api[_-]?key[=:]\s*\S+", "api_key=[REDACTED]"),
        (r"(?i)password[=:]\s*\S+", "password=[REDACTED]"),
        (r"(?:/[A-Za-z0-9_.\-]+){3,}", "[REDACTED_PATH]"),
    ];

    for (pat, repl) in patterns {
        if let Ok(re) = regex::Regex::new(pat) {
            s = re.replace_all(&s, *repl).into_owned();
        }
    }

    if s.len() > 500 {
        s.truncate(500);
        s.push_str("...[truncated]");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_api_keys_and_bearer_tokens() {
        let raw = "request failed: Authorization: Bearer sk-abcdef1234567890 at /home/user/.secrets/key";
        let clean = sanitize_error(raw);
        assert!(!clean.contains("sk-abcdef1234567890"));
        assert!(!clean.contains("/home/user/.secrets/key"));
    }

    #[test]
    fn truncates_long_errors() {
        let raw = "x".repeat(1000);
        let clean = sanitize_error(&raw);
        assert!(clean.len() <= 520);
    }
}

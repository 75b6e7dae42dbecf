//! LLM Gateway (spec.md §4.4) — provider-aware chat-completion adapter.
//!
//! New module: the teacher's only LLM usage was an optional OpenAI-compatible
//! synthesis call buried in `deep_research.rs`. This generalizes that into
//! the REDESIGN FLAG spec.md §9 asks for — a `ProviderKind` sum type plus a
//! `ProviderAdapter` trait (`build_request`/`parse_response`/
//! `parse_finish_reason`) — grounded on the adapter shape in
//! `other_examples/7cebee81_saorsa-labs-fae__src-fae_llm-mod.rs.rs`
//! (`ProviderAdapter`, per-provider error variants), built on the teacher's
//! existing `reqwest` client and `thiserror` error modeling.

mod adapters;
mod gateway;

pub use gateway::{ChatMessage, GatewayError, LlmGateway, LlmReply, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAiCompatible,
    AnthropicNative,
}

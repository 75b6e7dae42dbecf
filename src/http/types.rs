//! Request/response bodies for the HTTP surface (spec.md §6's endpoint
//! table). Grounded on the teacher's `core::types` request/response
//! structs (flat, serde-derived, one struct per route) but reshaped to
//! the research endpoints this crate actually exposes.

use crate::core::types::{ContextState, Language, ResearchArea};
use serde::{Deserialize, Serialize};

fn default_max_step() -> u8 {
    5
}

/// Shared provider fields every LLM-calling endpoint accepts (spec.md
/// §6's `api_key, provider, work_model, base_url` cluster).
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderFields {
    pub api_key: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    pub work_model: String,
    #[serde(default)]
    pub final_model: Option<String>,
    pub base_url: String,
    #[serde(default)]
    pub language: Language,
}

fn default_provider() -> String {
    "openai_compatible".to_string()
}

impl ProviderFields {
    pub fn into_api_config(self) -> crate::core::config::ApiConfig {
        let final_model = self.final_model.unwrap_or_else(|| self.work_model.clone());
        crate::core::config::ApiConfig {
            provider: crate::core::config::ApiConfig::provider_from_str(&self.provider),
            base_url: self.base_url,
            api_key: self.api_key,
            work_model: self.work_model,
            final_model,
            language: self.language,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct OverviewRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub provider: ProviderFields,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub session_title: String,
    pub queries_initial: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_max_step")]
    pub max_step: u8,
    #[serde(flatten)]
    pub provider: ProviderFields,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub user_query: String,
    #[serde(default)]
    pub clarification_questions: Vec<String>,
    #[serde(default)]
    pub clarification_answers: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub academic_mode: bool,
    #[serde(flatten)]
    pub provider: ProviderFields,
}

#[derive(Debug, Deserialize)]
pub struct PlanReviseRequest {
    pub context_state: ContextState,
    pub feedback: String,
    /// The plan text returned by the prior `/research/plan` or
    /// `/research/plan/revise` call — not part of `context_state`
    /// (`plan_text` lives at the top level of `PlanResponse`), so the
    /// client round-trips it explicitly here.
    #[serde(default)]
    pub previous_plan_text: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub academic_mode: bool,
    #[serde(flatten)]
    pub provider: ProviderFields,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan_points: Vec<String>,
    pub plan_text: String,
    pub context_state: ContextState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_bereiche: Option<Vec<ResearchArea>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeepRequest {
    pub context_state: ContextState,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub provider: ProviderFields,
}

#[derive(Debug, Deserialize)]
pub struct AcademicRequest {
    pub context_state: ContextState,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub provider: ProviderFields,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub user_query: String,
    pub status: String,
    pub completed_points: usize,
    pub remaining_points: usize,
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub session_id: String,
    pub api_key: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    pub work_model: String,
    #[serde(default)]
    pub final_model: Option<String>,
    pub base_url: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct AskStartRequest {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub api_key: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub work_model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Serialize)]
pub struct AskStartResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskListResponse {
    pub sessions: Vec<crate::core::app_state::AskSessionRecord>,
}

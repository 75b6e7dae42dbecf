//! Wire and domain types shared across the orchestrator.
//!
//! Grounded on `core::types` in the teacher (`SearchResult`, `ScrapeResponse`-style
//! flat structs, serde throughout) but re-scoped to the research data model in
//! spec.md §3 rather than the generic scraping-tool payloads the teacher exposed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MAX_USER_QUERY_CHARS: usize = 10_000;
pub const MAX_PAGE_CONTENT_CHARS: usize = 10_000;
pub const MAX_URLS_PER_BATCH: usize = 100;

/// `session_id`: short hex digest derived from `sha1(user_query || plan-joined)`
/// (spec.md §3). `plan_joined` is the plan's points/areas flattened into one
/// string; callers pass whatever is available at session-creation time.
pub fn derive_session_id(user_query: &str, plan_joined: &str) -> String {
    use sha1::{Digest, Sha1};
    let mut hasher = Sha1::new();
    hasher.update(user_query.as_bytes());
    hasher.update(plan_joined.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..16].to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Flat,
    Academic,
    Ask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    En,
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_query: String,
    pub mode: Mode,
    pub language: Language,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_modified: chrono::DateTime<chrono::Utc>,
    pub status: String,
}

/// `ResearchPlan` for Flat mode is just `points`; for Academic mode `areas` is
/// populated instead and `points` stays empty. Kept as one struct (rather than
/// an enum) because `/research/plan/revise` round-trips whichever shape the
/// plan already has.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub points: Vec<String>,
    pub areas: Vec<ResearchArea>,
    pub plan_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchArea {
    pub title: String,
    pub points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ThinkFailed,
    NoQueries,
    NoResults,
    NoUrlsAfterRetry,
    ScrapeEmpty,
    DossierFailed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::ThinkFailed => "think_failed",
            SkipReason::NoQueries => "no_queries",
            SkipReason::NoResults => "no_results",
            SkipReason::NoUrlsAfterRetry => "no_urls_after_retry",
            SkipReason::ScrapeEmpty => "scrape_empty",
            SkipReason::DossierFailed => "dossier_failed",
        }
    }
}

/// Outcome of running the Worker Loop over one point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointOutcome {
    pub point: String,
    pub completed: bool,
    pub skip_reason: Option<SkipReason>,
    pub dossier: Option<Dossier>,
}

impl PointOutcome {
    pub fn completed(dossier: Dossier) -> Self {
        Self { point: dossier.point.clone(), completed: true, skip_reason: None, dossier: Some(dossier) }
    }

    pub fn skipped(point: impl Into<String>, reason: SkipReason) -> Self {
        Self { point: point.into(), completed: false, skip_reason: Some(reason), dossier: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dossier {
    pub point: String,
    pub sources: Vec<String>,
    pub body: String,
    pub key_learnings: String,
    /// Local index (1..N as emitted by the LLM) -> URL, authoritative for renumbering.
    pub local_citations: HashMap<u32, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Connected,
    Status,
    StepStart,
    StepProgress,
    StepDone,
    Sources,
    PointComplete,
    BereichStart,
    BereichComplete,
    SynthesisStart,
    MetaSynthesisStart,
    Log,
    SessionId,
    Done,
    Error,
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl EventEnvelope {
    pub fn new(event_type: EventType, message: impl Into<String>) -> Self {
        Self {
            event_type,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Persisted checkpoint snapshot — see spec.md §4.7. Written atomically
/// (write-to-`.tmp`, rename, `.bak` copy) by `checkpoint::CheckpointStore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: String,
    pub user_query: String,
    pub research_plan: ResearchPlan,
    pub completed_dossiers: Vec<Dossier>,
    pub accumulated_learnings: Vec<String>,
    pub remaining_points: Vec<String>,
    pub status: String,
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

/// Shared context threaded between `/research/overview`, `/research/plan`,
/// `/research/plan/revise` and `/research/deep`. Recovered from
/// `original_source/lutum/researcher/context_state.py` — the distilled spec
/// names the endpoints that pass this value around but not its shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextState {
    pub user_query: String,
    pub session_title: String,
    pub overview_queries: Vec<String>,
    pub clarification_questions: Vec<String>,
    pub clarification_answers: Vec<String>,
    pub academic_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

//! Route handlers (spec.md §6). Validation follows the teacher's
//! `(StatusCode, Json<ErrorResponse>)` idiom where a plain JSON error
//! fits; everything that can fail mid-orchestration uses
//! `core::errors::OrchestratorError` instead so sanitization is uniform.

use crate::core::app_state::{AppState, AskSessionRecord, PendingAsk};
use crate::core::config::ApiConfig;
use crate::core::errors::OrchestratorError;
use crate::core::types::{
    derive_session_id, EventEnvelope, EventType, Language, ResearchArea, ResearchPlan, MAX_USER_QUERY_CHARS,
};
use crate::http::stream::{ndjson_response, sse_response};
use crate::http::types::*;
use crate::orchestrator::{academic, ask, flat, resume, setup_pipeline};
use crate::prompts::plan as plan_prompt;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use axum::http::StatusCode;
use futures::stream;
use std::sync::Arc;
use std::time::Duration;

const PLAN_TIMEOUT: Duration = Duration::from_secs(90);
const PLAN_MAX_TOKENS: u32 = 4000;

fn bad_request(msg: impl Into<String>) -> OrchestratorError {
    OrchestratorError::BadRequest(msg.into())
}

fn check_query_len(field: &str, value: &str) -> Result<(), OrchestratorError> {
    if value.trim().is_empty() {
        return Err(bad_request(format!("{field} must not be empty")));
    }
    if value.chars().count() > MAX_USER_QUERY_CHARS {
        return Err(bad_request(format!("{field} exceeds the {MAX_USER_QUERY_CHARS}-character limit")));
    }
    Ok(())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", service: "veritas" })
}

pub async fn overview(State(state): State<Arc<AppState>>, Json(req): Json<OverviewRequest>) -> Result<Response, OrchestratorError> {
    check_query_len("message", &req.message)?;
    let config = req.provider.into_api_config();
    let outcome = setup_pipeline::build_overview(&state.gateway, &state.search, &config, &req.message).await;
    Ok(Json(OverviewResponse {
        session_title: outcome.context.session_title,
        queries_initial: outcome.context.overview_queries,
        raw_response: outcome.raw_response,
        error: outcome.error,
    })
    .into_response())
}

/// `/research/run`: a single-shot pipeline over `max_step` (spec.md §6,
/// §9 "behavior for values 4-5 is undefined, the pipeline short-circuits
/// after step 3" — values 3, 4 and 5 are all treated identically here,
/// matching that short-circuit).
pub async fn run(State(state): State<Arc<AppState>>, Json(req): Json<RunRequest>) -> Result<Response, OrchestratorError> {
    check_query_len("message", &req.message)?;
    let language = req.provider.language;
    let config = req.provider.into_api_config();

    let overview_outcome = setup_pipeline::build_overview(&state.gateway, &state.search, &config, &req.message).await;

    if req.max_step <= 1 {
        let session_id = req.session_id.unwrap_or_else(|| derive_session_id(&req.message, ""));
        let events = vec![
            EventEnvelope::new(EventType::SessionId, "session assigned")
                .with_data(serde_json::json!({ "session_id": session_id })),
            EventEnvelope::new(EventType::Done, "overview complete").with_data(serde_json::json!({
                "session_title": overview_outcome.context.session_title,
                "queries_initial": overview_outcome.context.overview_queries,
            })),
        ];
        return Ok(ndjson_response(stream::iter(events)));
    }

    let plan_messages = plan_prompt::build_flat(&req.message, &overview_outcome.context.clarification_questions, &[]);
    let plan_text = state
        .gateway
        .complete(&config, &plan_messages, PLAN_MAX_TOKENS, PLAN_TIMEOUT, false)
        .await
        .map(|r| r.content)
        .unwrap_or_default();
    let plan_points = plan_prompt::parse_flat(&plan_text);

    if req.max_step == 2 || plan_points.is_empty() {
        let session_id = req.session_id.unwrap_or_else(|| derive_session_id(&req.message, &plan_points.join("\n")));
        let events = vec![
            EventEnvelope::new(EventType::SessionId, "session assigned")
                .with_data(serde_json::json!({ "session_id": session_id })),
            EventEnvelope::new(EventType::Done, "plan complete")
                .with_data(serde_json::json!({ "plan_points": plan_points, "plan_text": plan_text })),
        ];
        return Ok(ndjson_response(stream::iter(events)));
    }

    let session_id = derive_session_id(&req.message, &plan_points.join("\n"));
    let event_stream = state.events.subscribe(&session_id);

    let state_for_task = state.clone();
    let input = flat::FlatRunInput { user_query: req.message, plan: ResearchPlan { points: plan_points, areas: vec![], plan_version: 1 }, language };
    tokio::spawn(async move {
        flat::run(&state_for_task.events, &state_for_task.checkpoints, &state_for_task.gateway, &state_for_task.search, &config, &state_for_task.log_buffers, input).await;
    });

    Ok(ndjson_response(event_stream))
}

pub async fn plan(State(state): State<Arc<AppState>>, Json(req): Json<PlanRequest>) -> Result<Response, OrchestratorError> {
    check_query_len("user_query", &req.user_query)?;
    let config = req.provider.into_api_config();

    let messages = if req.academic_mode {
        plan_prompt::build_academic(&req.user_query, &req.clarification_questions, &req.clarification_answers)
    } else {
        plan_prompt::build_flat(&req.user_query, &req.clarification_questions, &req.clarification_answers)
    };

    let reply = state.gateway.complete(&config, &messages, PLAN_MAX_TOKENS, PLAN_TIMEOUT, false).await;
    let (plan_text, error) = match reply {
        Ok(r) => (r.content, None),
        Err(e) => (String::new(), Some(format!("plan generation failed: {e}"))),
    };

    let (plan_points, areas) = if req.academic_mode {
        let areas = plan_prompt::parse_academic(&plan_text);
        (areas.iter().flat_map(|a| a.points.clone()).collect(), Some(areas))
    } else {
        (plan_prompt::parse_flat(&plan_text), None)
    };

    let context_state = crate::core::types::ContextState {
        user_query: req.user_query,
        academic_mode: req.academic_mode,
        clarification_questions: req.clarification_questions,
        clarification_answers: req.clarification_answers,
        session_id: req.session_id,
        ..Default::default()
    };

    Ok(Json(PlanResponse { plan_points, plan_text, context_state, academic_bereiche: areas, error }).into_response())
}

pub async fn plan_revise(State(state): State<Arc<AppState>>, Json(req): Json<PlanReviseRequest>) -> Result<Response, OrchestratorError> {
    check_query_len("feedback", &req.feedback)?;
    let config = req.provider.into_api_config();

    let messages = plan_prompt::build_revise(&req.previous_plan_text, &req.feedback, req.academic_mode);
    let reply = state.gateway.complete(&config, &messages, PLAN_MAX_TOKENS, PLAN_TIMEOUT, false).await;
    let (plan_text, error) = match reply {
        Ok(r) => (r.content, None),
        Err(e) => (String::new(), Some(format!("plan revision failed: {e}"))),
    };

    let (plan_points, areas): (Vec<String>, Option<Vec<ResearchArea>>) = if req.academic_mode {
        let areas = plan_prompt::parse_academic(&plan_text);
        (areas.iter().flat_map(|a| a.points.clone()).collect(), Some(areas))
    } else {
        (plan_prompt::parse_flat(&plan_text), None)
    };

    Ok(Json(PlanResponse { plan_points, plan_text, context_state: req.context_state, academic_bereiche: areas, error }).into_response())
}

pub async fn deep(State(state): State<Arc<AppState>>, Json(req): Json<DeepRequest>) -> Result<Response, OrchestratorError> {
    check_query_len("context_state.user_query", &req.context_state.user_query)?;
    let language = req.provider.language;
    let config = req.provider.into_api_config();

    let plan_messages = plan_prompt::build_flat(
        &req.context_state.user_query,
        &req.context_state.clarification_questions,
        &req.context_state.clarification_answers,
    );
    let plan_text = state.gateway.complete(&config, &plan_messages, PLAN_MAX_TOKENS, PLAN_TIMEOUT, false).await.map(|r| r.content).unwrap_or_default();
    let plan_points = plan_prompt::parse_flat(&plan_text);

    let session_id = derive_session_id(&req.context_state.user_query, &plan_points.join("\n"));
    let event_stream = state.events.subscribe(&session_id);

    let state_for_task = state.clone();
    let input = flat::FlatRunInput { user_query: req.context_state.user_query, plan: ResearchPlan { points: plan_points, areas: vec![], plan_version: 1 }, language };
    tokio::spawn(async move {
        flat::run(&state_for_task.events, &state_for_task.checkpoints, &state_for_task.gateway, &state_for_task.search, &config, &state_for_task.log_buffers, input).await;
    });

    Ok(ndjson_response(event_stream))
}

pub async fn academic_run(State(state): State<Arc<AppState>>, Json(req): Json<AcademicRequest>) -> Result<Response, OrchestratorError> {
    check_query_len("context_state.user_query", &req.context_state.user_query)?;
    let language = req.provider.language;
    let config = req.provider.into_api_config();

    let plan_messages = plan_prompt::build_academic(
        &req.context_state.user_query,
        &req.context_state.clarification_questions,
        &req.context_state.clarification_answers,
    );
    let plan_text = state.gateway.complete(&config, &plan_messages, PLAN_MAX_TOKENS, PLAN_TIMEOUT, true).await.map(|r| r.content).unwrap_or_default();
    let areas = plan_prompt::parse_academic(&plan_text);

    let plan_joined: String = areas.iter().flat_map(|a| a.points.clone()).collect::<Vec<_>>().join("\n");
    let session_id = derive_session_id(&req.context_state.user_query, &plan_joined);
    let event_stream = state.events.subscribe(&session_id);

    let state_for_task = state.clone();
    let input = academic::AcademicRunInput { user_query: req.context_state.user_query, areas, language };
    tokio::spawn(async move {
        academic::run(&state_for_task.events, &state_for_task.checkpoints, &state_for_task.gateway, &state_for_task.search, &config, &state_for_task.log_buffers, input).await;
    });

    Ok(ndjson_response(event_stream))
}

pub async fn events(State(state): State<Arc<AppState>>, Path(session_id): Path<String>) -> impl IntoResponse {
    sse_response(state.events.subscribe(&session_id))
}

pub async fn sessions(State(state): State<Arc<AppState>>) -> Json<SessionsResponse> {
    let sessions = state
        .checkpoints
        .list()
        .into_iter()
        .map(|c| SessionSummary {
            session_id: c.session_id,
            user_query: c.user_query,
            status: c.status,
            completed_points: c.completed_dossiers.len(),
            remaining_points: c.remaining_points.len(),
            last_modified: c.last_modified,
        })
        .collect();
    Json(SessionsResponse { sessions })
}

pub async fn session_by_id(State(state): State<Arc<AppState>>, Path(session_id): Path<String>) -> Result<Response, OrchestratorError> {
    match state.checkpoints.load(&session_id).map_err(OrchestratorError::Internal)? {
        Some(checkpoint) => Ok(Json(checkpoint).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "unknown session" }))).into_response()),
    }
}

pub async fn resume_run(State(state): State<Arc<AppState>>, Json(req): Json<ResumeRequest>) -> Result<Response, OrchestratorError> {
    check_query_len("session_id", &req.session_id)?;
    let config = ApiConfig {
        provider: ApiConfig::provider_from_str(&req.provider),
        base_url: req.base_url,
        api_key: req.api_key,
        work_model: req.work_model.clone(),
        final_model: req.final_model.unwrap_or(req.work_model),
        language: req.language,
    };

    let event_stream = state.events.subscribe(&req.session_id);
    let state_for_task = state.clone();
    let session_id = req.session_id;
    let language = req.language;
    tokio::spawn(async move {
        resume::run(&state_for_task.events, &state_for_task.checkpoints, &state_for_task.gateway, &state_for_task.search, &config, &state_for_task.log_buffers, &session_id, language).await;
    });

    Ok(ndjson_response(event_stream))
}

const DEFAULT_ASK_WORK_MODEL: &str = "gpt-4o-mini";
const DEFAULT_ASK_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

pub async fn ask_start(State(state): State<Arc<AppState>>, Json(req): Json<AskStartRequest>) -> Result<Response, OrchestratorError> {
    check_query_len("question", &req.question)?;

    let config = ApiConfig {
        provider: ApiConfig::provider_from_str(&req.provider),
        base_url: req.base_url.unwrap_or_else(|| DEFAULT_ASK_BASE_URL.to_string()),
        api_key: req.api_key,
        work_model: req.work_model.clone().unwrap_or_else(|| DEFAULT_ASK_WORK_MODEL.to_string()),
        final_model: req.work_model.unwrap_or_else(|| DEFAULT_ASK_WORK_MODEL.to_string()),
        language: req.language,
    };

    let session_id = derive_session_id(&req.question, "ask");

    state.ask_sessions.insert(
        session_id.clone(),
        AskSessionRecord { session_id: session_id.clone(), question: req.question.clone(), status: "pending".to_string(), created_at: chrono::Utc::now() },
    );
    state.ask_pending.insert(session_id.clone(), PendingAsk { question: req.question, config });

    Ok(Json(AskStartResponse { session_id, status: "pending".to_string(), message: "ask session registered, connect to /ask/events/{id} to start it".to_string(), error: None })
        .into_response())
}

/// Lazily starts the Ask orchestrator on first connection — the Event
/// Bus has no replay buffer, so starting eagerly in `/ask/start` would
/// drop every event emitted before the client's follow-up GET arrives.
pub async fn ask_events(State(state): State<Arc<AppState>>, Path(session_id): Path<String>) -> impl IntoResponse {
    let event_stream = state.events.subscribe(&session_id);

    if let Some((_, pending)) = state.ask_pending.remove(&session_id) {
        if let Some(mut record) = state.ask_sessions.get_mut(&session_id) {
            record.status = "running".to_string();
        }
        let state_for_task = state.clone();
        let session_id_for_task = session_id.clone();
        tokio::spawn(async move {
            ask::run(&state_for_task.events, &state_for_task.gateway, &state_for_task.search, &pending.config, &state_for_task.log_buffers, &pending.question).await;
            if let Some(mut record) = state_for_task.ask_sessions.get_mut(&session_id_for_task) {
                record.status = "complete".to_string();
            }
        });
    }

    sse_response(event_stream)
}

pub async fn ask_list(State(state): State<Arc<AppState>>) -> Json<AskListResponse> {
    let sessions = state.ask_sessions.iter().map(|e| e.value().clone()).collect();
    Json(AskListResponse { sessions })
}

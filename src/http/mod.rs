//! HTTP surface (spec.md §6): axum router wiring the Mode Orchestrators,
//! Event Bus, and Checkpoint Store into the endpoint table.
//!
//! Grounded on the teacher's `main.rs` router construction
//! (`CorsLayer::permissive()`, `TraceLayer::new_for_http()`,
//! `.with_state(state)`), replacing its MCP/scrape/search tool routes
//! with the research endpoints this crate exposes.

pub mod handlers;
pub mod stream;
pub mod types;

use crate::core::app_state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/research/overview", post(handlers::overview))
        .route("/research/run", post(handlers::run))
        .route("/research/plan", post(handlers::plan))
        .route("/research/plan/revise", post(handlers::plan_revise))
        .route("/research/deep", post(handlers::deep))
        .route("/research/academic", post(handlers::academic_run))
        .route("/research/events/{session_id}", get(handlers::events))
        .route("/research/sessions", get(handlers::sessions))
        .route("/research/session/{id}", get(handlers::session_by_id))
        .route("/research/resume", post(handlers::resume_run))
        .route("/ask/start", post(handlers::ask_start))
        .route("/ask/events/{session_id}", get(handlers::ask_events))
        .route("/ask/list", get(handlers::ask_list))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Flat Deep Research orchestrator (spec.md §4.8 "Flat Deep Research").
//!
//! Grounded on the teacher's single-pass `deep_research.rs` tool handler,
//! generalized from one hardcoded synthesis call into the full
//! think/search/pick/scrape/dossier loop per point, with checkpointing
//! and citation renumbering threaded through.

use crate::checkpoint::CheckpointStore;
use crate::citations::CitationRegistry;
use crate::core::config::ApiConfig;
use crate::core::types::{derive_session_id, Checkpoint, Dossier, EventEnvelope, EventType, Language, ResearchPlan};
use crate::events::{log_buffer, EventBus, LogBuffers};
use crate::fetch::SearchService;
use crate::llm::LlmGateway;
use crate::prompts::{conclusion, messages};
use crate::worker::{self, WorkerContext};
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::Instrument;

const FINAL_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(20 * 60);
const FINAL_SYNTHESIS_MAX_TOKENS: u32 = 32_000;

pub struct FlatRunInput {
    pub user_query: String,
    pub plan: ResearchPlan,
    pub language: Language,
}

pub async fn run(
    bus: &EventBus,
    checkpoints: &CheckpointStore,
    gateway: &LlmGateway,
    search: &SearchService,
    config: &ApiConfig,
    log_buffers: &LogBuffers,
    input: FlatRunInput,
) {
    let session_id = derive_session_id(&input.user_query, &input.plan.points.join("\n"));
    let span = tracing::info_span!("session", session_id = %session_id);
    run_inner(bus, checkpoints, gateway, search, config, log_buffers, input, session_id).instrument(span).await
}

async fn run_inner(
    bus: &EventBus,
    checkpoints: &CheckpointStore,
    gateway: &LlmGateway,
    search: &SearchService,
    config: &ApiConfig,
    log_buffers: &LogBuffers,
    input: FlatRunInput,
    session_id: String,
) {
    let started_at = Instant::now();
    bus.emit(
        &session_id,
        EventEnvelope::new(EventType::Status, messages::starting(input.language, input.plan.points.len())),
    );
    bus.emit(
        &session_id,
        EventEnvelope::new(EventType::SessionId, "session assigned").with_data(json!({ "session_id": session_id })),
    );

    let mut registry = CitationRegistry::new();
    let mut completed_dossiers: Vec<Dossier> = Vec::new();
    let mut accumulated_learnings: Vec<String> = Vec::new();

    save_checkpoint(checkpoints, &session_id, &input, &completed_dossiers, &accumulated_learnings, "started");

    let total = input.plan.points.len();
    for (idx, point) in input.plan.points.iter().enumerate() {
        let mut ctx = WorkerContext { gateway, search, config, registry: &mut registry, bus, session_id: &session_id, log_buffers };
        let outcome = worker::run_point(&mut ctx, point, &accumulated_learnings).await;

        if outcome.completed {
            let dossier = outcome.dossier.expect("completed outcome carries a dossier");
            if !dossier.key_learnings.trim().is_empty() {
                accumulated_learnings.push(dossier.key_learnings.clone());
            }
            completed_dossiers.push(dossier);
            bus.emit(
                &session_id,
                EventEnvelope::new(EventType::PointComplete, messages::point_complete(input.language, idx + 1, total))
                    .with_data(json!({ "index": idx + 1, "completed": true })),
            );
        } else {
            let reason = outcome.skip_reason.expect("skipped outcome carries a reason");
            bus.emit(
                &session_id,
                EventEnvelope::new(
                    EventType::PointComplete,
                    messages::point_skipped(input.language, idx + 1, reason.as_str()),
                )
                .with_data(json!({ "index": idx + 1, "completed": false, "reason": reason.as_str() })),
            );
        }

        save_checkpoint(
            checkpoints,
            &session_id,
            &input,
            &completed_dossiers,
            &accumulated_learnings,
            &format!("dossier_{}_complete", idx + 1),
        );
    }

    bus.emit(&session_id, EventEnvelope::new(EventType::SynthesisStart, messages::synthesis_start(input.language)));

    let dossier_texts: Vec<String> = completed_dossiers.iter().map(|d| d.body.clone()).collect();
    let final_document = if dossier_texts.is_empty() {
        fallback_concatenation(&completed_dossiers)
    } else {
        let synthesis_messages = conclusion::build_final_synthesis(&input.user_query, &input.plan.points, &dossier_texts);
        let synthesis_result = gateway.complete(config, &synthesis_messages, FINAL_SYNTHESIS_MAX_TOKENS, FINAL_SYNTHESIS_TIMEOUT, true).await;
        log_buffer::flush(log_buffers, bus, &session_id);
        match synthesis_result {
            Ok(reply) => reply.content,
            Err(e) => {
                tracing::warn!("final synthesis failed, falling back to concatenation: {}", e);
                fallback_concatenation(&completed_dossiers)
            }
        }
    };

    let duration_seconds = started_at.elapsed().as_secs();
    save_checkpoint(checkpoints, &session_id, &input, &completed_dossiers, &accumulated_learnings, "completed");

    log_buffer::flush(log_buffers, bus, &session_id);
    bus.emit(
        &session_id,
        EventEnvelope::new(EventType::Done, messages::done(input.language, duration_seconds)).with_data(json!({
            "final_document": final_document,
            "total_points": total,
            "total_sources": registry.global_map().len(),
            "duration_seconds": duration_seconds,
            "source_registry": registry.global_map(),
        })),
    );
}

fn fallback_concatenation(dossiers: &[Dossier]) -> String {
    let mut out = String::from("# Research Result\n\n");
    for dossier in dossiers {
        out.push_str(&format!("## {}\n\n{}\n\n", dossier.point, dossier.body));
    }
    out
}

fn save_checkpoint(
    checkpoints: &CheckpointStore,
    session_id: &str,
    input: &FlatRunInput,
    completed_dossiers: &[Dossier],
    accumulated_learnings: &[String],
    status: &str,
) {
    let completed_points: Vec<String> = completed_dossiers.iter().map(|d| d.point.clone()).collect();
    let remaining_points = crate::checkpoint::remaining_points(&input.plan, &completed_points);

    let checkpoint = Checkpoint {
        session_id: session_id.to_string(),
        user_query: input.user_query.clone(),
        research_plan: input.plan.clone(),
        completed_dossiers: completed_dossiers.to_vec(),
        accumulated_learnings: accumulated_learnings.to_vec(),
        remaining_points,
        status: status.to_string(),
        last_modified: chrono::Utc::now(),
    };

    if let Err(e) = checkpoints.save(&checkpoint) {
        tracing::error!("failed to save checkpoint for session {}: {:#}", session_id, e);
    }
}

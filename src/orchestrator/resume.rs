//! Resume orchestrator (spec.md §4.7, §8 S4): reload a checkpoint and
//! continue the Worker Loop over its `remaining_points`, reusing the
//! already-completed dossiers byte-for-byte and continuing the global
//! citation counter rather than restarting it.
//!
//! Flat-mode checkpoints resume exactly as the original run would have
//! continued. Academic-mode checkpoints don't persist per-area groupings
//! (`accumulated_learnings` is area-scoped during the live run but the
//! checkpoint only carries a flat `completed_dossiers` list — see
//! `orchestrator::academic::save_checkpoint`), so resuming an academic
//! session treats the remaining points as one flat continuation rather
//! than re-deriving area boundaries. This is recorded as a design
//! decision, not a bug: academic progress is never lost, only the area
//! framing of the *remaining* points is coarsened on resume.

use crate::checkpoint::CheckpointStore;
use crate::citations::CitationRegistry;
use crate::core::config::ApiConfig;
use crate::core::types::{Checkpoint, Dossier, EventEnvelope, EventType, Language};
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

pub async fn run(
    bus: &EventBus,
    checkpoints: &CheckpointStore,
    gateway: &LlmGateway,
    search: &SearchService,
    config: &ApiConfig,
    log_buffers: &LogBuffers,
    session_id: &str,
    language: Language,
) {
    let span = tracing::info_span!("session", session_id = %session_id);
    run_inner(bus, checkpoints, gateway, search, config, log_buffers, session_id, language).instrument(span).await
}

async fn run_inner(
    bus: &EventBus,
    checkpoints: &CheckpointStore,
    gateway: &LlmGateway,
    search: &SearchService,
    config: &ApiConfig,
    log_buffers: &LogBuffers,
    session_id: &str,
    language: Language,
) {
    let checkpoint = match checkpoints.load(session_id) {
        Ok(Some(c)) => c,
        Ok(None) => {
            bus.emit(
                session_id,
                EventEnvelope::new(EventType::Error, "no checkpoint found for session").with_data(json!({ "session_id": session_id })),
            );
            return;
        }
        Err(e) => {
            tracing::error!("failed to load checkpoint {}: {:#}", session_id, e);
            bus.emit(session_id, EventEnvelope::new(EventType::Error, "failed to load checkpoint"));
            return;
        }
    };

    let started_at = Instant::now();
    let flat_points: Vec<String> = if checkpoint.research_plan.areas.is_empty() {
        checkpoint.research_plan.points.clone()
    } else {
        checkpoint.research_plan.areas.iter().flat_map(|a| a.points.clone()).collect()
    };
    let remaining = remaining_points_all(&flat_points, &checkpoint);

    bus.emit(session_id, EventEnvelope::new(EventType::Status, messages::starting(language, flat_points.len())));
    bus.emit(
        session_id,
        EventEnvelope::new(EventType::SessionId, "session assigned").with_data(json!({ "session_id": session_id })),
    );

    let mut registry = CitationRegistry::rebuild_from_dossiers(&checkpoint.completed_dossiers);
    let mut completed_dossiers = checkpoint.completed_dossiers.clone();
    let mut accumulated_learnings = checkpoint.accumulated_learnings.clone();

    let total = flat_points.len();
    let already_done = completed_dossiers.len();
    for (idx, point) in remaining.iter().enumerate() {
        let mut ctx = WorkerContext { gateway, search, config, registry: &mut registry, bus, session_id, log_buffers };
        let outcome = worker::run_point(&mut ctx, point, &accumulated_learnings).await;
        let position = already_done + idx + 1;

        if outcome.completed {
            let dossier = outcome.dossier.expect("completed outcome carries a dossier");
            bus.emit(session_id, EventEnvelope::new(EventType::Sources, "sources selected").with_data(json!({ "urls": dossier.sources })));
            if !dossier.key_learnings.trim().is_empty() {
                accumulated_learnings.push(dossier.key_learnings.clone());
            }
            completed_dossiers.push(dossier);
            bus.emit(
                session_id,
                EventEnvelope::new(EventType::PointComplete, messages::point_complete(language, position, total))
                    .with_data(json!({ "index": position, "completed": true })),
            );
        } else {
            let reason = outcome.skip_reason.expect("skipped outcome carries a reason");
            bus.emit(
                session_id,
                EventEnvelope::new(EventType::PointComplete, messages::point_skipped(language, position, reason.as_str()))
                    .with_data(json!({ "index": position, "completed": false, "reason": reason.as_str() })),
            );
        }

        save_checkpoint(checkpoints, session_id, &checkpoint, &completed_dossiers, &accumulated_learnings, &format!("dossier_{position}_complete"));
    }

    bus.emit(session_id, EventEnvelope::new(EventType::SynthesisStart, messages::synthesis_start(language)));

    let dossier_texts: Vec<String> = completed_dossiers.iter().map(|d| d.body.clone()).collect();
    let final_document = if dossier_texts.is_empty() {
        fallback_concatenation(&completed_dossiers)
    } else {
        let synthesis_messages = conclusion::build_final_synthesis(&checkpoint.user_query, &flat_points, &dossier_texts);
        let synthesis_result = gateway.complete(config, &synthesis_messages, FINAL_SYNTHESIS_MAX_TOKENS, FINAL_SYNTHESIS_TIMEOUT, true).await;
        log_buffer::flush(log_buffers, bus, session_id);
        match synthesis_result {
            Ok(reply) => reply.content,
            Err(e) => {
                tracing::warn!("resume final synthesis failed, falling back to concatenation: {}", e);
                fallback_concatenation(&completed_dossiers)
            }
        }
    };

    let duration_seconds = started_at.elapsed().as_secs();
    save_checkpoint(checkpoints, session_id, &checkpoint, &completed_dossiers, &accumulated_learnings, "completed");

    log_buffer::flush(log_buffers, bus, session_id);
    bus.emit(
        session_id,
        EventEnvelope::new(EventType::Done, messages::done(language, duration_seconds)).with_data(json!({
            "final_document": final_document,
            "total_points": total,
            "total_sources": registry.global_map().len(),
            "duration_seconds": duration_seconds,
            "source_registry": registry.global_map(),
        })),
    );
}

fn remaining_points_all(flat_points: &[String], checkpoint: &Checkpoint) -> Vec<String> {
    if !checkpoint.remaining_points.is_empty() {
        return checkpoint.remaining_points.clone();
    }
    let completed: Vec<String> = checkpoint.completed_dossiers.iter().map(|d| d.point.clone()).collect();
    flat_points.iter().filter(|p| !completed.contains(p)).cloned().collect()
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
    original: &Checkpoint,
    completed_dossiers: &[Dossier],
    accumulated_learnings: &[String],
    status: &str,
) {
    let completed_points: Vec<String> = completed_dossiers.iter().map(|d| d.point.clone()).collect();
    let flat_points: Vec<String> = if original.research_plan.areas.is_empty() {
        original.research_plan.points.clone()
    } else {
        original.research_plan.areas.iter().flat_map(|a| a.points.clone()).collect()
    };
    let remaining: Vec<String> = flat_points.into_iter().filter(|p| !completed_points.contains(p)).collect();

    let checkpoint = Checkpoint {
        session_id: session_id.to_string(),
        user_query: original.user_query.clone(),
        research_plan: original.research_plan.clone(),
        completed_dossiers: completed_dossiers.to_vec(),
        accumulated_learnings: accumulated_learnings.to_vec(),
        remaining_points: remaining,
        status: status.to_string(),
        last_modified: chrono::Utc::now(),
    };
    if let Err(e) = checkpoints.save(&checkpoint) {
        tracing::error!("failed to save checkpoint for session {}: {:#}", session_id, e);
    }
}

//! Academic orchestrator (spec.md §4.8 "Academic"): hierarchical areas,
//! each with area-scoped accumulated learnings, synthesized individually
//! and then combined into a meta-synthesis/conclusion.

use crate::checkpoint::CheckpointStore;
use crate::citations::CitationRegistry;
use crate::core::config::ApiConfig;
use crate::core::types::{derive_session_id, Checkpoint, Dossier, EventEnvelope, EventType, Language, ResearchArea, ResearchPlan};
use crate::events::{log_buffer, EventBus, LogBuffers};
use crate::fetch::SearchService;
use crate::llm::LlmGateway;
use crate::prompts::{area_synthesis, conclusion, messages};
use crate::worker::{self, WorkerContext};
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::Instrument;

const AREA_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(180);
const AREA_SYNTHESIS_MAX_TOKENS: u32 = 48_000;
const CONCLUSION_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const CONCLUSION_MAX_TOKENS: u32 = 96_000;

pub struct AcademicRunInput {
    pub user_query: String,
    pub areas: Vec<ResearchArea>,
    pub language: Language,
}

struct AreaResult {
    title: String,
    synthesis: String,
    sources: Vec<String>,
    dossiers: Vec<Dossier>,
}

pub async fn run(
    bus: &EventBus,
    checkpoints: &CheckpointStore,
    gateway: &LlmGateway,
    search: &SearchService,
    config: &ApiConfig,
    log_buffers: &LogBuffers,
    input: AcademicRunInput,
) {
    let plan_joined: String = input.areas.iter().flat_map(|a| a.points.iter()).cloned().collect::<Vec<_>>().join("\n");
    let session_id = derive_session_id(&input.user_query, &plan_joined);
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
    input: AcademicRunInput,
    session_id: String,
) {
    let started_at = Instant::now();
    let total_points: usize = input.areas.iter().map(|a| a.points.len()).sum();
    bus.emit(&session_id, EventEnvelope::new(EventType::Status, messages::starting(input.language, total_points)));
    bus.emit(
        &session_id,
        EventEnvelope::new(EventType::SessionId, "session assigned").with_data(json!({ "session_id": session_id })),
    );

    let mut registry = CitationRegistry::new();
    let mut area_results: Vec<AreaResult> = Vec::new();
    let mut all_completed: Vec<Dossier> = Vec::new();

    let plan = ResearchPlan { points: vec![], areas: input.areas.clone(), plan_version: 1 };

    for area in &input.areas {
        bus.emit(&session_id, EventEnvelope::new(EventType::BereichStart, messages::bereich_start(input.language, &area.title)));

        // Area-scoped learnings — spec.md §4.6 step 12: academic mode
        // scopes accumulated learnings to one area, not the whole run.
        let mut area_learnings: Vec<String> = Vec::new();
        let mut area_dossiers: Vec<Dossier> = Vec::new();
        let mut area_sources: Vec<String> = Vec::new();

        for point in &area.points {
            let mut ctx = WorkerContext { gateway, search, config, registry: &mut registry, bus, session_id: &session_id, log_buffers };
            let outcome = worker::run_point(&mut ctx, point, &area_learnings).await;

            if outcome.completed {
                let dossier = outcome.dossier.expect("completed outcome carries a dossier");
                area_sources.extend(dossier.sources.clone());
                if !dossier.key_learnings.trim().is_empty() {
                    area_learnings.push(dossier.key_learnings.clone());
                }
                area_dossiers.push(dossier);
            } else {
                let reason = outcome.skip_reason.expect("skipped outcome carries a reason");
                tracing::info!("point in area '{}' skipped: {}", area.title, reason.as_str());
            }
        }

        let synthesis = if area_dossiers.is_empty() {
            format!("No dossiers were produced for area '{}'.", area.title)
        } else {
            let dossier_texts: Vec<String> = area_dossiers.iter().map(|d| d.body.clone()).collect();
            let messages_for_area = area_synthesis::build(&area.title, &dossier_texts);
            let area_result = gateway.complete(config, &messages_for_area, AREA_SYNTHESIS_MAX_TOKENS, AREA_SYNTHESIS_TIMEOUT, true).await;
            log_buffer::flush(log_buffers, bus, &session_id);
            match area_result {
                Ok(reply) => reply.content,
                Err(e) => {
                    tracing::warn!("area synthesis failed for '{}', falling back to concatenation: {}", area.title, e);
                    dossier_texts.join("\n\n")
                }
            }
        };

        all_completed.extend(area_dossiers.clone());
        area_results.push(AreaResult {
            title: area.title.clone(),
            synthesis,
            sources: area_sources,
            dossiers: area_dossiers,
        });

        bus.emit(&session_id, EventEnvelope::new(EventType::BereichComplete, messages::bereich_complete(input.language, &area.title)));

        save_checkpoint(checkpoints, &session_id, &input.user_query, &plan, &all_completed, "area_in_progress");
    }

    bus.emit(&session_id, EventEnvelope::new(EventType::MetaSynthesisStart, messages::meta_synthesis_start(input.language)));

    let area_syntheses: Vec<(String, String)> = area_results.iter().map(|r| (r.title.clone(), r.synthesis.clone())).collect();
    let conclusion_text = if area_syntheses.is_empty() {
        "No areas produced a synthesis.".to_string()
    } else {
        let messages_for_conclusion = conclusion::build_academic_conclusion(&input.user_query, &area_syntheses);
        let conclusion_result = gateway.complete(config, &messages_for_conclusion, CONCLUSION_MAX_TOKENS, CONCLUSION_TIMEOUT, true).await;
        log_buffer::flush(log_buffers, bus, &session_id);
        match conclusion_result {
            Ok(reply) => reply.content,
            Err(e) => {
                tracing::warn!("academic conclusion failed, degrading to a notice: {}", e);
                "A conclusion could not be generated; see individual area syntheses below.".to_string()
            }
        }
    };

    let final_document = build_legacy_final_document(&area_results, &conclusion_text);
    let duration_seconds = started_at.elapsed().as_secs();

    save_checkpoint(checkpoints, &session_id, &input.user_query, &plan, &all_completed, "completed");

    log_buffer::flush(log_buffers, bus, &session_id);
    bus.emit(
        &session_id,
        EventEnvelope::new(EventType::Done, messages::done(input.language, duration_seconds)).with_data(json!({
            "syntheses": area_results.iter().map(|r| json!({
                "title": r.title,
                "content": r.synthesis,
                "source_count": r.sources.len(),
                "dossier_count": r.dossiers.len(),
            })).collect::<Vec<_>>(),
            "conclusion": conclusion_text,
            "final_document": final_document,
            "total_sources": registry.global_map().len(),
            "duration_seconds": duration_seconds,
        })),
    );
}

fn build_legacy_final_document(areas: &[AreaResult], conclusion_text: &str) -> String {
    let mut out = String::from("# Research Result\n\n");
    for area in areas {
        out.push_str(&format!("## {}\n\n{}\n\n", area.title, area.synthesis));
    }
    out.push_str(&format!("## Conclusion\n\n{conclusion_text}\n"));
    out
}

fn save_checkpoint(
    checkpoints: &CheckpointStore,
    session_id: &str,
    user_query: &str,
    plan: &ResearchPlan,
    completed_dossiers: &[Dossier],
    status: &str,
) {
    let checkpoint = Checkpoint {
        session_id: session_id.to_string(),
        user_query: user_query.to_string(),
        research_plan: plan.clone(),
        completed_dossiers: completed_dossiers.to_vec(),
        accumulated_learnings: vec![],
        remaining_points: vec![],
        status: status.to_string(),
        last_modified: chrono::Utc::now(),
    };
    if let Err(e) = checkpoints.save(&checkpoint) {
        tracing::error!("failed to save checkpoint for session {}: {:#}", session_id, e);
    }
}

//! Ask orchestrator (spec.md §4.8 "Ask (6-stage verification)"): five LLM
//! calls interleaved with two scrape phases, producing a cited answer
//! plus a cross-checked verification verdict.
//!
//! Scrape phases route through the same single-shared-browser, sequential
//! `fetch::scrape_batch` as the Worker Loop (spec.md §5 pins scraping
//! concurrency to 1 session-wide); "scrape concurrently" in spec.md §4.8
//! is realized here as per-URL progress events emitted as each page
//! finishes, since only one page is in flight at a time regardless of mode.

use crate::core::config::ApiConfig;
use crate::core::types::{derive_session_id, EventEnvelope, EventType, Language, SearchResult};
use crate::events::{log_buffer, EventBus, LogBuffers};
use crate::fetch::{scrape_batch, SearchService};
use crate::llm::LlmGateway;
use crate::prompts::{ask as ask_prompt, messages};
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::Instrument;

const STAGE_TIMEOUT_SHORT: Duration = Duration::from_secs(60);
const STAGE_TIMEOUT_LONG: Duration = Duration::from_secs(120);
const STAGE_MAX_TOKENS: u32 = 4000;
const SCRAPE_CAP: usize = 10;

struct StageCtx<'a> {
    gateway: &'a LlmGateway,
    config: &'a ApiConfig,
    log_buffers: &'a LogBuffers,
    bus: &'a EventBus,
    session_id: &'a str,
}

pub async fn run(bus: &EventBus, gateway: &LlmGateway, search: &SearchService, config: &ApiConfig, log_buffers: &LogBuffers, question: &str) {
    let session_id = derive_session_id(question, "ask");
    let span = tracing::info_span!("session", session_id = %session_id);
    run_inner(bus, gateway, search, config, log_buffers, question, session_id).instrument(span).await
}

async fn run_inner(
    bus: &EventBus,
    gateway: &LlmGateway,
    search: &SearchService,
    config: &ApiConfig,
    log_buffers: &LogBuffers,
    question: &str,
    session_id: String,
) {
    let started_at = Instant::now();
    let language = config.language;
    bus.emit(
        &session_id,
        EventEnvelope::new(EventType::SessionId, "session assigned").with_data(json!({ "session_id": session_id })),
    );
    let ctx = StageCtx { gateway, config, log_buffers, bus, session_id: &session_id };

    // C1 Intent.
    bus.emit(&session_id, stage_start(language, "intent"));
    let intent = call_stage(&ctx, ask_prompt::build_intent(question), STAGE_TIMEOUT_SHORT).await;
    bus.emit(&session_id, stage_content(language, "intent", &intent, None));

    // C2 Knowledge gaps.
    bus.emit(&session_id, stage_start(language, "knowledge"));
    let gaps = call_stage(&ctx, ask_prompt::build_knowledge_gaps(question, &intent), STAGE_TIMEOUT_SHORT).await;
    bus.emit(&session_id, stage_content(language, "knowledge", &gaps, None));

    // C3 Queries.
    bus.emit(&session_id, stage_start(language, "queries"));
    let queries_raw = call_stage(&ctx, ask_prompt::build_queries(question, &gaps), STAGE_TIMEOUT_SHORT).await;
    let queries = ask_prompt::parse_queries(&queries_raw);
    bus.emit(&session_id, stage_content(language, "queries", &queries_raw, None));

    // Scrape Phase 1: top-1 URL per query, capped to 10.
    let phase1_urls = top_url_per_query(&search.search_batch(&queries).await, SCRAPE_CAP);
    let phase1_sources = scrape_with_progress(bus, &session_id, language, "answer", &phase1_urls).await;

    // C4 Answer.
    bus.emit(&session_id, stage_start(language, "answer"));
    let formatted_sources = format_sources(&phase1_sources);
    let answer = call_stage(&ctx, ask_prompt::build_answer(question, &formatted_sources), STAGE_TIMEOUT_LONG).await;
    bus.emit(&session_id, stage_content(language, "answer", &answer, Some(&phase1_urls)));

    // C5 Audit.
    bus.emit(&session_id, stage_start(language, "audit"));
    let audit_raw = call_stage(&ctx, ask_prompt::build_audit(&answer), STAGE_TIMEOUT_SHORT).await;
    let audit_items = ask_prompt::parse_audit(&audit_raw);
    bus.emit(&session_id, stage_content(language, "audit", &audit_raw, None));

    // Scrape Phase 2: verification queries.
    let verification_queries: Vec<String> = audit_items.iter().map(|i| i.verification_query.clone()).collect();
    let phase2_urls = top_url_per_query(&search.search_batch(&verification_queries).await, SCRAPE_CAP);
    let phase2_sources = scrape_with_progress(bus, &session_id, language, "verification", &phase2_urls).await;

    // C6 Verification.
    bus.emit(&session_id, stage_start(language, "verification"));
    let formatted_verification_sources = format_sources(&phase2_sources);
    let verification = call_stage(
        &ctx,
        ask_prompt::build_verification(&answer, &audit_items, &formatted_verification_sources),
        STAGE_TIMEOUT_LONG,
    )
    .await;
    let validated = ask_prompt::parse_validated(&verification);
    bus.emit(&session_id, stage_content(language, "verification", &verification, Some(&phase2_urls)));

    let total_sources = phase1_sources.len() + phase2_sources.len();
    let duration = started_at.elapsed().as_secs();
    log_buffer::flush(log_buffers, bus, &session_id);
    bus.emit(
        &session_id,
        EventEnvelope::new(EventType::Done, messages::ask_done(language, duration)).with_data(json!({
            "duration_seconds": duration,
            "total_sources": total_sources,
            "validated": validated,
        })),
    );
}

async fn call_stage(ctx: &StageCtx<'_>, messages: Vec<crate::llm::ChatMessage>, timeout: Duration) -> String {
    let result = ctx.gateway.complete(ctx.config, &messages, STAGE_MAX_TOKENS, timeout, false).await;
    log_buffer::flush(ctx.log_buffers, ctx.bus, ctx.session_id);
    match result {
        Ok(reply) => reply.content,
        Err(e) => {
            tracing::warn!("ask-mode stage call failed: {}", e);
            String::new()
        }
    }
}

fn top_url_per_query(results: &[SearchResult], cap: usize) -> Vec<String> {
    let mut seen_queries = std::collections::HashSet::new();
    let mut urls = Vec::new();
    for result in results {
        if seen_queries.insert(result.query.clone()) {
            urls.push(result.url.clone());
        }
        if urls.len() >= cap {
            break;
        }
    }
    urls
}

async fn scrape_with_progress(
    bus: &EventBus,
    session_id: &str,
    language: Language,
    phase: &str,
    urls: &[String],
) -> Vec<(String, String)> {
    bus.emit(
        session_id,
        EventEnvelope::new(EventType::StepStart, messages::ask_scrape_start(language, phase, urls.len()))
            .with_data(json!({ "phase": phase, "url_count": urls.len() })),
    );

    let pages = scrape_batch(urls, false).await;
    let mut successful = Vec::new();
    for page in &pages {
        bus.emit(
            session_id,
            EventEnvelope::new(EventType::StepProgress, messages::ask_scrape_progress(language, &page.url))
                .with_data(json!({ "phase": phase, "url": page.url, "success": page.success })),
        );
        if let (true, Some(content)) = (page.success, page.content.clone()) {
            successful.push((page.url.clone(), content));
        }
    }

    bus.emit(
        session_id,
        EventEnvelope::new(EventType::StepDone, messages::ask_scrape_done(language, phase, successful.len()))
            .with_data(json!({ "phase": phase, "successful": successful.len() })),
    );

    successful
}

fn format_sources(pages: &[(String, String)]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(i, (url, content))| {
            let snippet: String = content.chars().take(2000).collect();
            format!("[{}] {}\n{}", i + 1, url, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn stage_start(language: Language, stage: &str) -> EventEnvelope {
    EventEnvelope::new(EventType::StepStart, messages::ask_stage_start(language, stage)).with_data(json!({ "stage": stage }))
}

fn stage_content(language: Language, stage: &str, content: &str, sources: Option<&[String]>) -> EventEnvelope {
    let mut data = json!({ "stage": stage, "content": content });
    if let Some(sources) = sources {
        data["sources"] = json!(sources);
    }
    EventEnvelope::new(EventType::StepDone, messages::ask_stage_complete(language, stage)).with_data(data)
}

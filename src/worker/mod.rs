//! Worker Loop (spec.md §4.6): per research point — think, search, pick
//! URLs (with dead-end retry), scrape, build a dossier, renumber its
//! citations, and report the outcome back to the orchestrator.
//!
//! New module grounded in the teacher's `deep_research.rs` control flow
//! shape (sequential staged calls, early-return on empty LLM output) but
//! driven by the Gateway/Prompt/Fetch layers rather than the teacher's
//! single hardcoded synthesis call.

use crate::citations::CitationRegistry;
use crate::core::config::ApiConfig;
use crate::core::types::{Dossier, EventEnvelope, EventType, PointOutcome, SkipReason};
use crate::events::{log_buffer, EventBus, LogBuffers};
use crate::fetch::{scrape_batch, SearchService};
use crate::llm::LlmGateway;
use crate::prompts::{dossier as dossier_prompt, pick_urls, think};
use serde_json::json;
use std::time::Duration;

const THINK_TIMEOUT: Duration = Duration::from_secs(60);
const PICK_TIMEOUT: Duration = Duration::from_secs(60);
const DOSSIER_TIMEOUT: Duration = Duration::from_secs(120);
const DOSSIER_MAX_TOKENS: u32 = 8000;
const OVERVIEW_PICK_COUNT: usize = 10;
const POINT_PICK_COUNT: usize = 20;
const MIN_URLS_BEFORE_RETRY: usize = 2;
const MIN_URLS_AFTER_RETRY: usize = 1;

pub struct WorkerContext<'a> {
    pub gateway: &'a LlmGateway,
    pub search: &'a SearchService,
    pub config: &'a ApiConfig,
    pub registry: &'a mut CitationRegistry,
    pub bus: &'a EventBus,
    pub session_id: &'a str,
    pub log_buffers: &'a LogBuffers,
}

/// Run the full per-point loop. Returns the outcome — either a completed
/// dossier or a skip reason — never panics on provider/search/scrape
/// failure; every failure mode maps to a named `SkipReason`.
pub async fn run_point(
    ctx: &mut WorkerContext<'_>,
    point: &str,
    accumulated_learnings: &[String],
) -> PointOutcome {
    // 1. Think.
    let think_messages = think::build(point, accumulated_learnings);
    let think_reply = match ctx
        .gateway
        .complete(ctx.config, &think_messages, 2000, THINK_TIMEOUT, false)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!("think call failed for point: {}", e);
            return PointOutcome::skipped(point, SkipReason::ThinkFailed);
        }
    };

    let think_result = think::parse(&think_reply.content);
    if think_result.search_queries.is_empty() {
        return PointOutcome::skipped(point, SkipReason::NoQueries);
    }

    // 2. Search.
    let mut results = ctx.search.search_batch(&think_result.search_queries).await;
    if results.is_empty() {
        return PointOutcome::skipped(point, SkipReason::NoResults);
    }

    // 3. Format + pick URLs.
    let formatted = pick_urls::format_results(&results, 1);
    let pick_messages = pick_urls::build(&formatted, POINT_PICK_COUNT, point);
    let mut picked_urls = match ctx
        .gateway
        .complete(ctx.config, &pick_messages, 2000, PICK_TIMEOUT, false)
        .await
    {
        Ok(reply) => pick_urls::parse(&reply.content),
        Err(_) => Vec::new(),
    };

    // 4. Retry on dead-end.
    if picked_urls.len() < MIN_URLS_BEFORE_RETRY {
        let reformulation = think::build_reformulation(point, &think_result.search_queries);
        if let Ok(reply) = ctx
            .gateway
            .complete(ctx.config, &reformulation, 2000, THINK_TIMEOUT, false)
            .await
        {
            let retry_result = think::parse(&reply.content);
            if !retry_result.search_queries.is_empty() {
                let retry_results = ctx.search.search_batch(&retry_result.search_queries).await;
                let counter_start = results.len() + 1;
                let retry_formatted = pick_urls::format_results(&retry_results, counter_start);
                let combined = format!("{formatted}\n{retry_formatted}");
                results.extend(retry_results);

                let retry_pick_messages = pick_urls::build(&combined, POINT_PICK_COUNT, point);
                if let Ok(reply) = ctx
                    .gateway
                    .complete(ctx.config, &retry_pick_messages, 2000, PICK_TIMEOUT, false)
                    .await
                {
                    picked_urls = pick_urls::parse(&reply.content);
                }
            }
        }

        if picked_urls.len() < MIN_URLS_AFTER_RETRY {
            return PointOutcome::skipped(point, SkipReason::NoUrlsAfterRetry);
        }
    }

    // 6. Emit the picked URL set before scraping starts (spec.md §4.6 step
    // 7) — this reports what was *selected*, not what later scrapes
    // successfully, so the event fires regardless of per-URL scrape outcome.
    ctx.bus.emit(
        ctx.session_id,
        EventEnvelope::new(EventType::Sources, "sources selected").with_data(json!({ "urls": picked_urls })),
    );

    // 7. Scrape.
    let scraped = scrape_batch(&picked_urls, true).await;
    let successful_pages: Vec<(String, String)> = scraped
        .iter()
        .filter(|p| p.success)
        .filter_map(|p| Some((p.url.clone(), p.content.clone()?)))
        .collect();
    if successful_pages.is_empty() {
        return PointOutcome::skipped(point, SkipReason::ScrapeEmpty);
    }
    let scraped_content = dossier_prompt::format_scraped_pages(&successful_pages);

    // 8. Dossier.
    let dossier_messages = dossier_prompt::build(point, accumulated_learnings, &scraped_content);
    let dossier_result = ctx
        .gateway
        .complete(ctx.config, &dossier_messages, DOSSIER_MAX_TOKENS, DOSSIER_TIMEOUT, false)
        .await;
    log_buffer::flush(ctx.log_buffers, ctx.bus, ctx.session_id);
    let dossier_reply = match dossier_result {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!("dossier call failed for point: {}", e);
            return PointOutcome::skipped(point, SkipReason::DossierFailed);
        }
    };

    let parsed = dossier_prompt::parse(&dossier_reply.content);

    // 9. Renumber citations — text and key_learnings both, via the shared
    // registry (spec.md §4.2 / §4.6 step 10).
    let renumbered_text = ctx.registry.renumber(&parsed.dossier_text, &parsed.local_citations);
    let renumbered_learnings = ctx.registry.renumber(&parsed.key_learnings, &parsed.local_citations);

    let sources: Vec<String> = successful_pages.iter().map(|(url, _)| url.clone()).collect();

    PointOutcome::completed(Dossier {
        point: point.to_string(),
        sources,
        body: renumbered_text,
        key_learnings: renumbered_learnings,
        local_citations: parsed.local_citations,
    })
}

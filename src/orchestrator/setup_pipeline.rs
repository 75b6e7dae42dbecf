//! Setup Pipeline (spec.md §2 table, §4.8 feeds into plan creation):
//! overview-queries → initial search → clarification questions, producing
//! the `ContextState` that `/research/plan` consumes.

use crate::core::config::ApiConfig;
use crate::core::types::ContextState;
use crate::fetch::{scrape_batch, SearchService};
use crate::llm::LlmGateway;
use crate::prompts::{clarify, overview, pick_urls};
use std::time::Duration;

const OVERVIEW_TIMEOUT: Duration = Duration::from_secs(60);
const CLARIFY_TIMEOUT: Duration = Duration::from_secs(60);
const OVERVIEW_PICK_COUNT: usize = 10;
const OVERVIEW_MAX_TOKENS: u32 = 2000;

pub struct OverviewOutcome {
    pub context: ContextState,
    pub raw_response: Option<String>,
    pub error: Option<String>,
}

/// `/research/overview`: generate a session title plus 10 diversified
/// queries, run them, scrape the top picks, and ask a clarifying
/// question pass. Errors at any stage degrade to an `error` field rather
/// than failing the whole request — the UI can still show partial state.
pub async fn build_overview(gateway: &LlmGateway, search: &SearchService, config: &ApiConfig, user_query: &str) -> OverviewOutcome {
    let overview_messages = overview::build(user_query);
    let overview_reply = match gateway.complete(config, &overview_messages, OVERVIEW_MAX_TOKENS, OVERVIEW_TIMEOUT, false).await {
        Ok(reply) => reply,
        Err(e) => {
            return OverviewOutcome {
                context: ContextState { user_query: user_query.to_string(), ..Default::default() },
                raw_response: None,
                error: Some(format!("overview generation failed: {e}")),
            };
        }
    };

    let parsed = overview::parse(&overview_reply.content);

    let search_results = search.search_batch(&parsed.queries).await;
    let formatted = pick_urls::format_results(&search_results, 1);
    let pick_messages = pick_urls::build(&formatted, OVERVIEW_PICK_COUNT, user_query);
    let picked_urls = match gateway.complete(config, &pick_messages, OVERVIEW_MAX_TOKENS, OVERVIEW_TIMEOUT, false).await {
        Ok(reply) => pick_urls::parse(&reply.content),
        Err(_) => Vec::new(),
    };

    let scraped = scrape_batch(&picked_urls, false).await;
    let overview_content: String = scraped
        .iter()
        .filter(|p| p.success)
        .filter_map(|p| p.content.clone())
        .collect::<Vec<_>>()
        .join("\n\n");

    let clarification_questions = if overview_content.trim().is_empty() {
        Vec::new()
    } else {
        let clarify_messages = clarify::build(user_query, &overview_content);
        match gateway.complete(config, &clarify_messages, OVERVIEW_MAX_TOKENS, CLARIFY_TIMEOUT, false).await {
            Ok(reply) => clarify::extract_questions_heuristic(&reply.content),
            Err(_) => Vec::new(),
        }
    };

    OverviewOutcome {
        context: ContextState {
            user_query: user_query.to_string(),
            session_title: parsed.session_title,
            overview_queries: parsed.queries,
            clarification_questions,
            clarification_answers: Vec::new(),
            academic_mode: false,
            session_id: None,
        },
        raw_response: Some(overview_reply.content),
        error: None,
    }
}

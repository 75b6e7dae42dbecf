//! Think prompt (spec.md §4.5/§4.6 step 1): for a point + optional
//! accumulated learnings, emit a reasoning block followed by up to 10
//! search queries.
//!
//! Diversification categories (primary/community/practical/critical/
//! current) are grounded on `original_source/lutum/researcher/prompts/think.py`;
//! wording rewritten in English and kept structural per spec.md §1
//! Non-goals.

use crate::llm::ChatMessage;
use crate::prompts::parse::{extract_section, parse_numbered_list};

const THINKING_START: &str = "=== THINKING ===";
const SEARCHES_START: &str = "=== SEARCHES ===";

pub fn build(point: &str, accumulated_learnings: &[String]) -> Vec<ChatMessage> {
    let system = format!(
        "You are a research strategist planning web searches for one \
        research point. Output format is mandatory: first '{THINKING_START}' \
        followed by your reasoning about what information is needed, then \
        '{SEARCHES_START}' followed by up to 10 lines of the form \
        'search N: <query>'. Generate plain keyword queries, never raw URLs \
        or site: operators. Spread queries across at least 4 perspectives: \
        primary sources, community discussion, practical examples, and \
        critical/comparative takes."
    );

    let learnings = if accumulated_learnings.is_empty() {
        "(none yet)".to_string()
    } else {
        accumulated_learnings.join("\n---\n")
    };

    let user = format!("Research point:\n{point}\n\nLearnings so far:\n{learnings}");

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Reformulation prompt used on dead-end retry (spec.md §4.6 step 6):
/// ask for 5 alternative queries with different keywords/perspectives.
pub fn build_reformulation(point: &str, prior_queries: &[String]) -> Vec<ChatMessage> {
    let system = format!(
        "Your previous search queries for this research point returned too \
        few usable results. Produce 5 NEW queries using different keywords \
        and a different angle than before. Output format: '{SEARCHES_START}' \
        followed by 5 lines of the form 'search N: <query>'."
    );

    let user = format!(
        "Research point:\n{point}\n\nPrevious queries that underperformed:\n{}",
        prior_queries.join("\n")
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

pub struct ThinkResult {
    pub thinking_block: String,
    pub search_queries: Vec<String>,
}

pub fn parse(raw: &str) -> ThinkResult {
    let thinking_block = extract_section(raw, THINKING_START, Some(SEARCHES_START))
        .unwrap_or("")
        .to_string();

    let searches_section = extract_section(raw, SEARCHES_START, None).unwrap_or(raw);
    let mut search_queries: Vec<String> = searches_section
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            let without_prefix = trimmed
                .strip_prefix("search")
                .map(|rest| rest.trim_start_matches(|c: char| c.is_ascii_digit() || c == ':' || c == ' '));
            without_prefix.map(|q| q.trim().to_string())
        })
        .filter(|q| !q.is_empty())
        .collect();

    if search_queries.is_empty() {
        // Tolerant fallback: maybe the model used plain numbered lines instead.
        search_queries = parse_numbered_list(searches_section);
    }

    search_queries.truncate(10);
    ThinkResult { thinking_block, search_queries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thinking_and_search_blocks() {
        let raw = "=== THINKING ===\nWe need primary and community sources.\n=== SEARCHES ===\nsearch 1: rust async tokio\nsearch 2: tokio reddit experiences";
        let result = parse(raw);
        assert!(result.thinking_block.contains("primary"));
        assert_eq!(result.search_queries, vec!["rust async tokio", "tokio reddit experiences"]);
    }

    #[test]
    fn falls_back_to_numbered_list_when_search_prefix_missing() {
        let raw = "=== SEARCHES ===\n1. rust async runtimes\n2. tokio vs async-std";
        let result = parse(raw);
        assert_eq!(result.search_queries.len(), 2);
    }
}

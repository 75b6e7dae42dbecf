//! Ask-mode prompts (spec.md §4.8 "Ask (6-stage verification)"): five LLM
//! stages interleaved with two scrape phases — intent restatement,
//! knowledge-gap enumeration, query generation, cited answer, audit, and
//! cross-checked verification.

use crate::llm::ChatMessage;
use crate::prompts::parse::{parse_numbered_list, sweep_urls};
use regex::Regex;
use std::sync::OnceLock;

pub fn build_intent(question: &str) -> Vec<ChatMessage> {
    let system = "Restate, in your own words, exactly what the user is \
        asking and what a satisfying answer would need to cover. Do not \
        answer the question yet.";
    vec![ChatMessage::system(system), ChatMessage::user(question.to_string())]
}

pub fn build_knowledge_gaps(question: &str, intent: &str) -> Vec<ChatMessage> {
    let system = "Given the restated intent, enumerate the distinct pieces \
        of information that must be found to answer it well. Use a numbered \
        list.";
    let user = format!("Question:\n{question}\n\nIntent:\n{intent}");
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

pub fn build_queries(question: &str, gaps: &str) -> Vec<ChatMessage> {
    let system = "Produce exactly 10 search queries that would find the \
        information enumerated below. Plain keyword queries only, one per \
        numbered line.";
    let user = format!("Question:\n{question}\n\nInformation needed:\n{gaps}");
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

pub fn parse_queries(raw: &str) -> Vec<String> {
    let mut queries = parse_numbered_list(raw);
    queries.truncate(10);
    queries
}

pub fn build_answer(question: &str, formatted_sources: &str) -> Vec<ChatMessage> {
    let system = "Answer the question using only the supplied sources. Cite \
        every claim inline as [N] matching the source list. If the sources \
        don't support a confident answer, say so.";
    let user = format!("Question:\n{question}\n\nSources:\n{formatted_sources}");
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

pub fn build_audit(answer: &str) -> Vec<ChatMessage> {
    let system = "List exactly 10 claims from the answer below that most \
        need independent verification. For each, write one line: \
        '<claim> → <verification search query>'.";
    vec![ChatMessage::system(system), ChatMessage::user(answer.to_string())]
}

fn audit_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(.+?)\s*→\s*(.+)$").unwrap())
}

pub struct AuditItem {
    pub claim: String,
    pub verification_query: String,
}

/// Parse audit lines containing `→` (spec.md §4.8 C5: "exactly 10 claims
/// each with a verification query (lines containing `→`)").
pub fn parse_audit(raw: &str) -> Vec<AuditItem> {
    audit_line_regex()
        .captures_iter(raw)
        .map(|c| AuditItem {
            claim: c[1].trim().to_string(),
            verification_query: c[2].trim().to_string(),
        })
        .collect()
}

pub fn build_verification(answer: &str, claims: &[AuditItem], formatted_verification_sources: &str) -> Vec<ChatMessage> {
    let system = "Cross-check the listed claims against the verification \
        sources below, citing them as [V1]..[Vn]. For each claim, state \
        whether it holds up. End with exactly one line, in English \
        regardless of the response language: 'Validated: Yes' or \
        'Validated: No'.";

    let claims_block = claims
        .iter()
        .map(|c| format!("- {} (check: {})", c.claim, c.verification_query))
        .collect::<Vec<_>>()
        .join("\n");

    let user = format!(
        "Original answer:\n{answer}\n\nClaims to verify:\n{claims_block}\n\nVerification sources:\n{formatted_verification_sources}"
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

fn validated_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^\s*Validated:\s*(Yes|No)\s*$").unwrap())
}

/// Extract the mandatory terminal `Validated: Yes|No` line. Absence is
/// treated as `None` rather than a default — the orchestrator decides
/// what an absent verdict means (spec.md leaves this to the caller).
pub fn parse_validated(raw: &str) -> Option<bool> {
    validated_line_regex()
        .captures(raw)
        .map(|c| c[1].eq_ignore_ascii_case("yes"))
}

pub fn sweep_cited_sources(raw: &str) -> Vec<String> {
    sweep_urls(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_audit_lines_with_arrow() {
        let raw = "The sky is blue → sky color physics explanation\nNot an audit line\nWater boils at 100C → boiling point sea level";
        let items = parse_audit(raw);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].claim, "The sky is blue");
        assert_eq!(items[0].verification_query, "sky color physics explanation");
    }

    #[test]
    fn parses_validated_line_case_insensitively() {
        assert_eq!(parse_validated("some text\nValidated: Yes\n"), Some(true));
        assert_eq!(parse_validated("some text\nvalidated: no\n"), Some(false));
        assert_eq!(parse_validated("no verdict line"), None);
    }
}

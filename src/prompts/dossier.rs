//! Dossier prompt (spec.md §4.5/§4.6 steps 8-9): produce a structured
//! per-point dossier with a `=== SOURCES ===` citation block and a
//! `## 💡 KEY LEARNINGS` section.
//!
//! The evidence-snippet/no-hallucination discipline is grounded on
//! `original_source/lutum/researcher/prompts/dossier.py`; wording
//! rewritten in English per spec.md §1 Non-goals, markers (`=== SOURCES
//! ===`, `## 💡 KEY LEARNINGS`, `=== QUELLE: <url> ===`) kept exactly as
//! spec.md §4.5/§4.6 specify since they are part of the wire contract,
//! not prompt prose.

use crate::core::types::MAX_PAGE_CONTENT_CHARS;
use crate::llm::ChatMessage;
use crate::prompts::parse::{clamp_input, extract_section};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const SOURCES_MARKER: &str = "=== SOURCES ===";
const KEY_LEARNINGS_MARKER: &str = "## 💡 KEY LEARNINGS";

/// Concatenate successfully-scraped pages into the single text block fed
/// to the dossier prompt, per-page capped and separated by
/// `=== QUELLE: <url> ===` headers (spec.md §4.6 step 8).
pub fn format_scraped_pages(pages: &[(String, String)]) -> String {
    pages
        .iter()
        .map(|(url, content)| {
            let mut truncated = content.clone();
            if truncated.chars().count() > MAX_PAGE_CONTENT_CHARS {
                truncated = truncated.chars().take(MAX_PAGE_CONTENT_CHARS).collect();
            }
            format!("=== QUELLE: {url} ===\n{truncated}")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build(point: &str, accumulated_learnings: &[String], scraped_content: &str) -> Vec<ChatMessage> {
    let system = format!(
        "You write a precise, evidence-grounded dossier for ONE research \
        point using only the supplied source text. Never invent facts not \
        present in the sources; if information is missing, say so plainly. \
        Every nontrivial claim needs a short supporting snippet from the \
        source it came from. End with '{SOURCES_MARKER}' listing each \
        source used as '[N] <url> — <title>', then '{KEY_LEARNINGS_MARKER}' \
        with a short (at most a few hundred words) summary of what was \
        learned, citing sources inline as [N]."
    );

    let learnings = if accumulated_learnings.is_empty() {
        "(none yet)".to_string()
    } else {
        accumulated_learnings.join("\n---\n")
    };

    let user = format!(
        "Research point:\n{point}\n\nPrior learnings:\n{learnings}\n\nSource material:\n{scraped_content}"
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

fn sources_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*\[(\d+)\]\s*(\S+)\s*(?:—|-)\s*(.+)$").unwrap())
}

pub struct DossierResult {
    pub dossier_text: String,
    pub key_learnings: String,
    pub local_citations: HashMap<u32, String>,
}

pub fn parse(raw: &str) -> DossierResult {
    let clamped = clamp_input(raw);

    let sources_block = extract_section(&clamped, SOURCES_MARKER, Some(KEY_LEARNINGS_MARKER)).unwrap_or("");
    let mut local_citations = HashMap::new();
    for cap in sources_line_regex().captures_iter(sources_block) {
        if let Ok(index) = cap[1].parse::<u32>() {
            local_citations.insert(index, cap[2].to_string());
        }
    }

    let key_learnings = extract_section(&clamped, KEY_LEARNINGS_MARKER, None)
        .unwrap_or("")
        .to_string();

    DossierResult { dossier_text: clamped, key_learnings, local_citations }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_scraped_pages_inserts_quelle_headers_and_caps_length() {
        let long = "x".repeat(MAX_PAGE_CONTENT_CHARS + 500);
        let pages = vec![("https://a.example".to_string(), long)];
        let out = format_scraped_pages(&pages);
        assert!(out.starts_with("=== QUELLE: https://a.example ==="));
        assert!(out.len() < MAX_PAGE_CONTENT_CHARS + 100);
    }

    #[test]
    fn parses_sources_block_and_key_learnings() {
        let raw = "Body text here.\n=== SOURCES ===\n[1] https://a.example — Title A\n[2] https://b.example — Title B\n## 💡 KEY LEARNINGS\nLearned that X [1] and Y [2].";
        let result = parse(raw);
        assert_eq!(result.local_citations.get(&1), Some(&"https://a.example".to_string()));
        assert_eq!(result.local_citations.get(&2), Some(&"https://b.example".to_string()));
        assert!(result.key_learnings.contains("Learned that X"));
    }
}

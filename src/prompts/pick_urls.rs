//! Pick URLs prompt (spec.md §4.5/§4.6 step 5): select exactly 10 (for
//! overview) or 20 (for per-point) URLs from a formatted result list.
//!
//! Selection-strategy framing (query-awareness, source-mix diversity) is
//! grounded on `original_source/lutum/researcher/prompts/pick_urls.py`;
//! parsing always falls back to a raw URL sweep since the model sometimes
//! ignores the requested `url N:` line format (spec.md §4.5).

use crate::core::types::SearchResult;
use crate::llm::ChatMessage;
use crate::prompts::parse::sweep_urls;

const SELECTED_MARKER: &str = "=== SELECTED ===";

/// Number formatted results into `[n] title / URL / snippet` lines, with
/// `counter` continuing across repeated calls within one point (spec.md
/// §4.6 step 4: "counter continuing across queries").
pub fn format_results(results: &[SearchResult], counter_start: usize) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] {} / {} / {}", counter_start + i, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build(formatted_results: &str, count: usize, point: &str) -> Vec<ChatMessage> {
    let system = format!(
        "You select the most useful URLs from a list of search results. \
        Output ONLY '{SELECTED_MARKER}' followed by exactly {count} lines of \
        the form 'url N: <url>' — no analysis, no explanation, nothing before \
        the marker. Favor a diverse mix: primary sources, community \
        discussion, practical guides, critical/comparative pieces, and \
        recent material. Avoid picking many URLs from the same domain."
    );

    let user = format!("Research point:\n{point}\n\nResults:\n{formatted_results}");

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Deduped URL list, always derived via a raw-URL sweep rather than
/// strict line parsing (spec.md §4.5: "regex sweep of all http(s) tokens").
pub fn parse(raw: &str) -> Vec<String> {
    sweep_urls(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SearchResult;

    #[test]
    fn format_results_continues_counter() {
        let results = vec![SearchResult {
            query: "q".into(),
            title: "T".into(),
            url: "https://example.com".into(),
            snippet: "s".into(),
        }];
        let out = format_results(&results, 5);
        assert!(out.starts_with("[5] T / https://example.com / s"));
    }

    #[test]
    fn parse_sweeps_urls_even_without_prefix_format() {
        let raw = "I think these: https://a.example and https://b.example are best.";
        let urls = parse(raw);
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
    }
}

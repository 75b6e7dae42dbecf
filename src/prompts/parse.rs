//! Tolerant parsers for LLM replies (spec.md §4.5).
//!
//! Grounded in parser-tolerance rules recovered from
//! `original_source/lutum/researcher/prompts/report_parser.py`: accept
//! `N)`, `N.`, `N:` and bullet `-` numbering, sweep for raw URLs when the
//! model ignores the requested line format, and cap input length and
//! line length before running any regex so a pathological reply can't
//! trigger catastrophic backtracking.

use regex::Regex;
use std::sync::OnceLock;

pub const MAX_PARSE_INPUT_BYTES: usize = 500 * 1024;
const MAX_LINE_CHARS: usize = 2000;

/// Clamp `raw` to the parser's input-length and per-line-length caps
/// before any further processing.
pub fn clamp_input(raw: &str) -> String {
    let bounded: &str = if raw.len() > MAX_PARSE_INPUT_BYTES {
        // Byte-truncate on a char boundary.
        let mut end = MAX_PARSE_INPUT_BYTES;
        while end > 0 && !raw.is_char_boundary(end) {
            end -= 1;
        }
        &raw[..end]
    } else {
        raw
    };

    bounded
        .lines()
        .map(|line| {
            if line.chars().count() > MAX_LINE_CHARS {
                line.chars().take(MAX_LINE_CHARS).collect::<String>()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn numbered_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:\d+[).:]|-)\s*(.+)$").unwrap())
}

/// Parse a numbered (or bulleted) list, accepting `N)`, `N.`, `N:` and `-`
/// prefixes. Lines that don't match any prefix are ignored rather than
/// aborting the whole parse — tolerant parsing over strict parsing.
pub fn parse_numbered_list(raw: &str) -> Vec<String> {
    let clamped = clamp_input(raw);
    let re = numbered_line_regex();
    clamped
        .lines()
        .filter_map(|line| {
            re.captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn url_sweep_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s<>\x22')\]]+").unwrap())
}

/// Regex sweep of every `http(s)://…` token in `raw`, in first-seen order,
/// deduplicated. Used for pick-urls parsing since the model sometimes
/// ignores the `url N: <url>` line format entirely (spec.md §4.5).
pub fn sweep_urls(raw: &str) -> Vec<String> {
    let clamped = clamp_input(raw);
    let mut seen = std::collections::HashSet::new();
    url_sweep_regex()
        .find_iter(&clamped)
        .map(|m| m.as_str().trim_end_matches(|c: char| ".,;:!?".contains(c)).to_string())
        .filter(|u| seen.insert(u.clone()))
        .collect()
}

/// Extract the text between `start_marker` and `end_marker` (or end of
/// string if `end_marker` is absent/not found).
pub fn extract_section<'a>(raw: &'a str, start_marker: &str, end_marker: Option<&str>) -> Option<&'a str> {
    let start = raw.find(start_marker)? + start_marker.len();
    let rest = &raw[start..];
    match end_marker.and_then(|m| rest.find(m)) {
        Some(end) => Some(rest[..end].trim()),
        None => Some(rest.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_numbering_variants() {
        let raw = "1) first\n2. second\n3: third\n- fourth\nnot a list item";
        let items = parse_numbered_list(raw);
        assert_eq!(items, vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn url_sweep_finds_urls_regardless_of_prefix_format() {
        let raw = "random prose https://example.com/a then\nurl 2: https://example.org/b.";
        let urls = sweep_urls(raw);
        assert_eq!(urls, vec!["https://example.com/a", "https://example.org/b"]);
    }

    #[test]
    fn clamp_input_caps_total_length_and_line_length() {
        let huge = "x".repeat(MAX_PARSE_INPUT_BYTES + 1000);
        assert!(clamp_input(&huge).len() <= MAX_PARSE_INPUT_BYTES);

        let long_line = "a".repeat(5000);
        let clamped = clamp_input(&long_line);
        assert_eq!(clamped.chars().count(), MAX_LINE_CHARS);
    }

    #[test]
    fn extract_section_reads_between_markers() {
        let raw = "intro === THINKING === body text === SEARCHES === search 1: x";
        let thinking = extract_section(raw, "=== THINKING ===", Some("=== SEARCHES ==="));
        assert_eq!(thinking, Some("body text"));
    }
}

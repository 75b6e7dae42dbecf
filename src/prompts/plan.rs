//! Plan prompts (spec.md §4.5): flat (≥5 numbered points with mandated
//! sub-structure) and academic (3-5 autonomous areas, 2-4 points each, at
//! least one critical area). Wording is original; structural requirements
//! — point sub-sections, area independence, critical-area minimum — are
//! carried over from spec.md §3/§4.5 verbatim as parser/validation rules.

use crate::core::types::ResearchArea;
use crate::llm::ChatMessage;
use crate::prompts::parse::{clamp_input, parse_numbered_list};
use regex::Regex;
use std::sync::OnceLock;

pub fn build_flat(
    user_query: &str,
    clarification_questions: &[String],
    clarification_answers: &[String],
) -> Vec<ChatMessage> {
    let system = "You are a research planner. Produce at least 5 numbered \
        research points. Each point must be self-contained and include five \
        labeled sub-sections: Goal, Queries, Filters, Output, Validation. \
        Number points as '1.', '2.', etc. Do not include any text before the \
        first numbered point.";

    let qa = format_clarification(clarification_questions, clarification_answers);
    let user = format!("User question:\n{user_query}\n\n{qa}");

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

pub fn build_academic(
    user_query: &str,
    clarification_questions: &[String],
    clarification_answers: &[String],
) -> Vec<ChatMessage> {
    let system = "You are a research planner structuring an academic-style \
        investigation. Produce 3 to 5 independently researchable areas. Each \
        area must have its own heading line 'AREA: <title>' followed by 2 to \
        4 numbered points with no cross-references to other areas. At least \
        one area must take a critical or skeptical angle (limitations, \
        counter-evidence, failure modes).";

    let qa = format_clarification(clarification_questions, clarification_answers);
    let user = format!("User question:\n{user_query}\n\n{qa}");

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// `/research/plan/revise`: feed the previous plan text back with the
/// user's feedback and ask for a revised plan in the same shape.
pub fn build_revise(previous_plan_text: &str, feedback: &str, academic_mode: bool) -> Vec<ChatMessage> {
    let system = if academic_mode {
        "You are revising an academic-style research plan (areas with \
            'AREA: <title>' headings, 2 to 4 numbered points each) based on \
            user feedback. Keep the same format."
    } else {
        "You are revising a numbered research plan (at least 5 points, each \
            with Goal/Queries/Filters/Output/Validation sub-sections) based \
            on user feedback. Keep the same format."
    };

    let user = format!("Previous plan:\n{previous_plan_text}\n\nRequested changes:\n{feedback}");
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

fn format_clarification(questions: &[String], answers: &[String]) -> String {
    if questions.is_empty() {
        return String::new();
    }
    let mut out = String::from("Clarification:\n");
    for (q, a) in questions.iter().zip(answers.iter()) {
        out.push_str(&format!("Q: {q}\nA: {a}\n"));
    }
    out
}

pub fn parse_flat(raw: &str) -> Vec<String> {
    parse_numbered_list(raw)
}

fn area_heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^\s*AREA:\s*(.+)\s*$").unwrap())
}

/// Split an academic-mode reply into ordered areas, each carrying the
/// numbered points that follow its `AREA:` heading up to the next one.
pub fn parse_academic(raw: &str) -> Vec<ResearchArea> {
    let clamped = clamp_input(raw);
    let re = area_heading_regex();

    let headings: Vec<_> = re.captures_iter(&clamped).map(|c| c.get(0).unwrap().range()).collect();
    if headings.is_empty() {
        return Vec::new();
    }

    let mut areas = Vec::new();
    for (idx, range) in headings.iter().enumerate() {
        let title = re
            .captures(&clamped[range.clone()])
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        if title.is_empty() {
            continue;
        }
        let body_start = range.end;
        let body_end = headings.get(idx + 1).map(|r| r.start).unwrap_or(clamped.len());
        let body = &clamped[body_start..body_end];
        let points = parse_numbered_list(body);
        if !points.is_empty() {
            areas.push(ResearchArea { title, points });
        }
    }
    areas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_plan_points() {
        let raw = "1. Goal: x. Queries: y. Filters: z. Output: w. Validation: v.\n2. Second point.";
        let points = parse_flat(raw);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn parses_academic_areas_with_their_points() {
        let raw = "AREA: Foundations\n1. point one\n2. point two\nAREA: Critical view\n1. point three";
        let areas = parse_academic(raw);
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].title, "Foundations");
        assert_eq!(areas[0].points.len(), 2);
        assert_eq!(areas[1].title, "Critical view");
        assert_eq!(areas[1].points.len(), 1);
    }
}

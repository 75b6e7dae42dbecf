//! Clarify prompt (spec.md §4.5): read scraped overview content, respond
//! with a positive-tone preamble plus up to 5 focusing questions (or a
//! statement that none are needed). Per spec.md Open Questions, the
//! implementation never formally extracts the numbered questions from
//! this string for reuse — it's passed through to the UI and re-parsed
//! heuristically downstream rather than structurally, matching the
//! original behavior rather than inventing a stricter contract.

use crate::llm::ChatMessage;
use crate::prompts::parse::parse_numbered_list;

pub fn build(user_query: &str, overview_content: &str) -> Vec<ChatMessage> {
    let system = "You help scope a research project. You've been given the \
        user's question and a quick scan of initial sources. Write a brief, \
        encouraging preamble acknowledging what you found, then ask up to 5 \
        focusing questions that would sharpen the research plan (scope, \
        depth, audience, specific angles). If the question is already \
        well-scoped, say so plainly instead of inventing questions.";

    let user = format!(
        "User question:\n{user_query}\n\nInitial source scan:\n{overview_content}"
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Heuristic extraction for the UI's convenience; the raw string is the
/// authoritative payload (spec.md's Open Questions section leaves the
/// structured-reuse question explicitly undecided).
pub fn extract_questions_heuristic(raw: &str) -> Vec<String> {
    let mut questions = parse_numbered_list(raw);
    questions.retain(|q| q.trim_end().ends_with('?'));
    questions.truncate(5);
    questions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_only_question_lines() {
        let raw = "Great start!\n1. What time period matters most?\n2. This isn't a question.\n3. Who is the audience?";
        let questions = extract_questions_heuristic(raw);
        assert_eq!(questions.len(), 2);
    }
}

//! Overview prompt (spec.md §4.5): session title + 10 diversified search
//! queries spanning primary/community/practical/critical/current sources.
//!
//! Wording is original — spec.md §1 Non-goals excludes prompt phrasing
//! from scope — but the role and output contract are grounded in
//! `original_source/lutum/researcher/prompts/think.py`'s diversification
//! categories, reused here for the overview stage's query spread.

use crate::llm::ChatMessage;
use crate::prompts::parse::parse_numbered_list;

pub fn build(user_query: &str) -> Vec<ChatMessage> {
    let system = "You are a research strategist. Given a user's question, \
        produce a short, descriptive session title and exactly 10 diversified \
        web search queries that will surface a well-rounded initial picture of \
        the topic. Spread the 10 queries across five categories, two each: \
        primary (official docs, sources, original material), community \
        (forums, discussions, first-hand reports), practical (tutorials, \
        how-tos, examples), critical (limitations, controversies, comparisons), \
        and current (recent developments, news). Never repeat the same query \
        reworded. Respond with the title on the first line prefixed \
        'TITLE:', then a numbered list of exactly 10 queries.";

    let user = format!("User question:\n{user_query}");

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

pub struct OverviewResult {
    pub session_title: String,
    pub queries: Vec<String>,
}

pub fn parse(raw: &str) -> OverviewResult {
    let session_title = raw
        .lines()
        .find_map(|l| l.trim().strip_prefix("TITLE:"))
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| "Untitled research session".to_string());

    let mut queries = parse_numbered_list(raw);
    queries.truncate(10);

    OverviewResult { session_title, queries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_and_queries() {
        let raw = "TITLE: Rust async runtimes\n1. tokio vs async-std\n2. tokio production reddit\n3. tokio tutorial beginners";
        let result = parse(raw);
        assert_eq!(result.session_title, "Rust async runtimes");
        assert_eq!(result.queries.len(), 3);
    }

    #[test]
    fn missing_title_falls_back_to_default() {
        let result = parse("1. just a query");
        assert_eq!(result.session_title, "Untitled research session");
    }
}

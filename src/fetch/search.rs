//! Sequential, rate-limited text search over a batch of queries
//! (spec.md §4.3, §5: "strictly sequentially, ≥1.5s inter-query delay").
//!
//! Grounded on the teacher's `tools::search` dispatch loop, simplified:
//! the teacher fanned out to multiple engines per query with a
//! non-robot/HITL fallback tier; here a single query tries engines in
//! `default_engines()` order until one returns a non-empty result set,
//! and a query that exhausts every engine simply contributes no results
//! rather than failing the batch.

use crate::core::types::SearchResult;
use crate::fetch::engines::{default_engines, SearchEngine};
use std::time::Duration;

const INTER_QUERY_DELAY: Duration = Duration::from_millis(1500);
const MAX_RESULTS_PER_QUERY: usize = 20;

pub struct SearchService {
    client: reqwest::Client,
    engines: Vec<Box<dyn SearchEngine>>,
}

impl SearchService {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            engines: default_engines(),
        }
    }

    /// Run every query in `queries` strictly sequentially, sleeping
    /// `INTER_QUERY_DELAY` between requests. A query that fails on every
    /// engine contributes an empty result set and the batch continues.
    pub async fn search_batch(&self, queries: &[String]) -> Vec<SearchResult> {
        let mut out = Vec::new();
        for (idx, query) in queries.iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(INTER_QUERY_DELAY).await;
            }
            out.extend(self.search_one(query).await);
        }
        out
    }

    async fn search_one(&self, query: &str) -> Vec<SearchResult> {
        let query = sanitize_query(query);
        if query.is_empty() {
            return Vec::new();
        }

        for engine in &self.engines {
            let results = engine.search(&self.client, &query, MAX_RESULTS_PER_QUERY).await;
            if !results.is_empty() {
                return results;
            }
            tracing::debug!("engine '{}' returned no results for query, trying next", engine.name());
        }

        tracing::warn!("all search engines exhausted for a query; returning empty result set");
        Vec::new()
    }
}

const MAX_QUERY_CHARS: usize = 500;

/// Strip quotes and cap length (spec.md §4.3: "quotes removed, length ≤500").
fn sanitize_query(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| *c != '"' && *c != '\'').collect();
    let trimmed = stripped.trim();
    if trimmed.chars().count() <= MAX_QUERY_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(MAX_QUERY_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_query_trims_and_caps() {
        assert_eq!(sanitize_query("  hello world  "), "hello world");
        let long = "a".repeat(1000);
        assert_eq!(sanitize_query(&long).chars().count(), MAX_QUERY_CHARS);
    }

    #[test]
    fn sanitize_query_empty_stays_empty() {
        assert_eq!(sanitize_query("   "), "");
    }
}

//! Citation Registry (spec.md §4.2): global monotonic mapping from
//! citation index to source URL, renumbering locally-numbered dossier
//! citations into a single session-wide sequence.
//!
//! No teacher equivalent (the teacher's tools were stateless per-call);
//! grounded in the session-scoped accumulator shape the teacher uses for
//! other per-run state (`core::app_state::AppState` session maps), applied
//! here to a dedicated, smaller struct since the registry's lifetime is
//! one orchestrator run, not the process.

use crate::core::types::Dossier;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn citation_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(\d{1,4})\]").unwrap())
}

/// Per-orchestrator-run citation registry. Not persisted — the renumbered
/// text in dossiers is what survives a checkpoint (spec.md §3).
#[derive(Debug, Default)]
pub struct CitationRegistry {
    next_global: u32,
    map: HashMap<u32, String>,
}

impl CitationRegistry {
    pub fn new() -> Self {
        Self { next_global: 1, map: HashMap::new() }
    }

    pub fn global_map(&self) -> &HashMap<u32, String> {
        &self.map
    }

    /// Reconstruct a registry's state from already-renumbered dossiers
    /// (spec.md §4.7 resume: a resumed run continues the global counter
    /// rather than restarting it at 1). Each dossier's surviving `[N]`
    /// tokens were assigned in ascending-local-index order by `renumber`,
    /// so zipping the distinct global tokens found (ascending) against
    /// that dossier's `local_citations` keys (also ascending) recovers
    /// the original global->URL pairing exactly.
    pub fn rebuild_from_dossiers(dossiers: &[Dossier]) -> Self {
        let re = citation_token_regex();
        let mut registry = Self::new();
        let mut max_global = 0u32;

        for dossier in dossiers {
            let combined = format!("{}\n{}", dossier.body, dossier.key_learnings);
            let mut globals: Vec<u32> = re
                .captures_iter(&combined)
                .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
                .collect();
            globals.sort_unstable();
            globals.dedup();

            let mut locals: Vec<u32> = dossier.local_citations.keys().copied().collect();
            locals.sort_unstable();

            for (global, local) in globals.iter().zip(locals.iter()) {
                if let Some(url) = dossier.local_citations.get(local) {
                    registry.map.insert(*global, url.clone());
                }
                max_global = max_global.max(*global);
            }
        }

        registry.next_global = max_global + 1;
        registry
    }

    /// Renumber `[N]` tokens found in `text` into globally-unique indices,
    /// using `local_citations` (local index -> URL) to register URLs.
    /// Returns the rewritten text. A distinct local N is assigned exactly
    /// one global index, reused for every occurrence of `[N]` in `text`.
    ///
    /// `next_global` only advances; a dossier that produces no `[N]`
    /// tokens leaves it untouched.
    pub fn renumber(&mut self, text: &str, local_citations: &HashMap<u32, String>) -> String {
        let re = citation_token_regex();

        let mut locals: Vec<u32> = re
            .captures_iter(text)
            .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
            .collect();
        locals.sort_unstable();
        locals.dedup();

        let mut local_to_global: HashMap<u32, u32> = HashMap::new();
        for local in &locals {
            let global = self.next_global;
            self.next_global += 1;
            local_to_global.insert(*local, global);

            // A dossier may reference `[N]` with no matching URL (off-by-one
            // LLM output); the token still gets a global index but no URL is
            // recorded, exposing the gap downstream (spec.md §4.2).
            if let Some(url) = local_citations.get(local) {
                self.map.insert(global, url.clone());
            }
        }

        // Rewrite highest-N to lowest-N in a single pass to avoid
        // collisions during string substitution (spec.md §4.2 step 3).
        let mut sorted_locals = locals;
        sorted_locals.sort_unstable_by(|a, b| b.cmp(a));

        let mut rewritten = text.to_string();
        for local in sorted_locals {
            let global = local_to_global[&local];
            let pattern = format!("[{local}]");
            let replacement = format!("[{global}]");
            rewritten = replace_token(&rewritten, &pattern, &replacement);
        }
        rewritten
    }
}

/// Replace whole `[N]`-shaped tokens only, never a substring that happens
/// to contain the digits (e.g. `[12]` must not be touched while rewriting
/// `[1]`).
fn replace_token(text: &str, pattern: &str, replacement: &str) -> String {
    let re = Regex::new(&regex::escape(pattern)).unwrap();
    // `[1]` can't collide with `[12]` since the bracket pins both ends.
    re.replace_all(text, regex::NoExpand(replacement)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renumbers_ascending_local_indices_to_global() {
        let mut registry = CitationRegistry::new();
        let mut locals = HashMap::new();
        locals.insert(1, "https://a.example".to_string());
        locals.insert(2, "https://b.example".to_string());

        let text = "Fact one [1]. Fact two [2]. Again [1].";
        let out = registry.renumber(text, &locals);
        assert_eq!(out, "Fact one [1]. Fact two [2]. Again [1].");
        assert_eq!(registry.global_map().get(&1), Some(&"https://a.example".to_string()));
        assert_eq!(registry.global_map().get(&2), Some(&"https://b.example".to_string()));
    }

    #[test]
    fn second_dossier_continues_global_counter() {
        let mut registry = CitationRegistry::new();
        let mut locals1 = HashMap::new();
        locals1.insert(1, "https://a.example".to_string());
        registry.renumber("see [1]", &locals1);

        let mut locals2 = HashMap::new();
        locals2.insert(1, "https://c.example".to_string());
        let out = registry.renumber("see [1]", &locals2);
        assert_eq!(out, "see [2]");
        assert_eq!(registry.global_map().get(&2), Some(&"https://c.example".to_string()));
    }

    #[test]
    fn unmapped_local_index_still_renumbered_but_leaves_a_gap() {
        let mut registry = CitationRegistry::new();
        let locals = HashMap::new(); // no URL for [1]
        let out = registry.renumber("claim [1]", &locals);
        assert_eq!(out, "claim [1]");
        assert!(registry.global_map().get(&1).is_none());
    }

    #[test]
    fn no_collision_between_single_and_double_digit_tokens() {
        let mut registry = CitationRegistry::new();
        // Burn through globals 1..=9 with an earlier dossier so this one's
        // locals map to double-digit globals that could collide with [1].
        let mut warmup = HashMap::new();
        for i in 1..=9u32 {
            warmup.insert(i, format!("https://warmup{i}.example"));
        }
        registry.renumber("[1][2][3][4][5][6][7][8][9]", &warmup);

        let mut locals = HashMap::new();
        locals.insert(1, "https://a.example".to_string());
        locals.insert(2, "https://b.example".to_string());
        // local [1] -> global [10], local [2] -> global [11]; rewriting
        // highest-to-lowest must not let [11] clobber a stray "[1]1".
        let out = registry.renumber("[1] and [2]", &locals);
        assert_eq!(out, "[10] and [11]");
    }

    #[test]
    fn rebuild_from_dossiers_recovers_global_map_and_counter() {
        let mut original = CitationRegistry::new();
        let mut locals_a = HashMap::new();
        locals_a.insert(1, "https://a.example".to_string());
        locals_a.insert(2, "https://b.example".to_string());
        let body_a = original.renumber("one [1] two [2]", &locals_a);

        let mut locals_b = HashMap::new();
        locals_b.insert(1, "https://c.example".to_string());
        let body_b = original.renumber("three [1]", &locals_b);

        let dossiers = vec![
            Dossier { point: "p1".into(), sources: vec![], body: body_a, key_learnings: String::new(), local_citations: locals_a },
            Dossier { point: "p2".into(), sources: vec![], body: body_b, key_learnings: String::new(), local_citations: locals_b },
        ];

        let rebuilt = CitationRegistry::rebuild_from_dossiers(&dossiers);
        assert_eq!(rebuilt.global_map(), original.global_map());

        let mut rebuilt = rebuilt;
        let mut locals_c = HashMap::new();
        locals_c.insert(1, "https://d.example".to_string());
        let body_c = rebuilt.renumber("four [1]", &locals_c);
        assert_eq!(body_c, "four [4]");
    }
}

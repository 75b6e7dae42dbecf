//! Area Synthesis prompt (spec.md §4.5/§4.8 Academic step 3): synthesize
//! one academic-mode area from its dossiers, preserving the global
//! citation numbers already assigned by the Citation Registry.

use crate::llm::ChatMessage;

pub fn build(area_title: &str, dossiers: &[String]) -> Vec<ChatMessage> {
    let system = "You synthesize a coherent narrative for one research area \
        from a set of already-written dossiers. Preserve every citation \
        marker ([N]) exactly as it appears — never renumber or invent new \
        ones. Organize by theme rather than repeating the dossiers in order; \
        note points of agreement and disagreement across sources.";

    let user = format!(
        "Area: {area_title}\n\nDossiers:\n{}",
        dossiers
            .iter()
            .enumerate()
            .map(|(i, d)| format!("--- Dossier {} ---\n{}", i + 1, d))
            .collect::<Vec<_>>()
            .join("\n\n")
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

//! Conclusion / Final Synthesis prompt (spec.md §4.5/§4.8): combine all
//! area syntheses (academic) or all dossiers (flat) into one structured
//! report, preserving global citation numbers throughout.

use crate::llm::ChatMessage;

pub fn build_final_synthesis(user_query: &str, plan_points: &[String], dossiers: &[String]) -> Vec<ChatMessage> {
    let system = "You write the final research report. Combine the supplied \
        dossiers into one coherent, well-organized document that directly \
        answers the user's question. Preserve every [N] citation marker \
        exactly as written. Use clear section headings; do not simply \
        concatenate the dossiers verbatim.";

    let user = format!(
        "User question:\n{user_query}\n\nPlan points covered:\n{}\n\nDossiers:\n{}",
        plan_points.join("\n"),
        dossiers
            .iter()
            .enumerate()
            .map(|(i, d)| format!("--- Dossier {} ---\n{}", i + 1, d))
            .collect::<Vec<_>>()
            .join("\n\n")
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

pub fn build_academic_conclusion(user_query: &str, area_syntheses: &[(String, String)]) -> Vec<ChatMessage> {
    let system = "You write the meta-synthesis that concludes an academic \
        research report. Combine the supplied area syntheses into an \
        overarching narrative: what the areas collectively establish, where \
        they reinforce or contradict each other, and what remains \
        uncertain. Preserve every [N] citation marker exactly as written.";

    let user = format!(
        "User question:\n{user_query}\n\nArea syntheses:\n{}",
        area_syntheses
            .iter()
            .map(|(title, content)| format!("--- {title} ---\n{content}"))
            .collect::<Vec<_>>()
            .join("\n\n")
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

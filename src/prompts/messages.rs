//! Status-message string table keyed by `Language` (spec.md §3: language
//! "affects status-message strings; does not affect content semantics").
//! LLM prompt/content wording is unaffected — this table only covers the
//! user-facing strings the orchestrator itself emits in `EventEnvelope`.

use crate::core::types::Language;

pub fn starting(language: Language, point_count: usize) -> String {
    match language {
        Language::De => format!("Starte Recherche mit {point_count} Punkten"),
        Language::En => format!("Starting research with {point_count} points"),
    }
}

pub fn point_complete(language: Language, index: usize, total: usize) -> String {
    match language {
        Language::De => format!("Punkt {index} von {total} abgeschlossen"),
        Language::En => format!("Point {index} of {total} complete"),
    }
}

pub fn point_skipped(language: Language, index: usize, reason: &str) -> String {
    match language {
        Language::De => format!("Punkt {index} übersprungen: {reason}"),
        Language::En => format!("Point {index} skipped: {reason}"),
    }
}

pub fn synthesis_start(language: Language) -> String {
    match language {
        Language::De => "Erstelle finale Synthese...".to_string(),
        Language::En => "Building final synthesis...".to_string(),
    }
}

pub fn meta_synthesis_start(language: Language) -> String {
    match language {
        Language::De => "Erstelle Meta-Synthese über alle Bereiche...".to_string(),
        Language::En => "Building meta-synthesis across all areas...".to_string(),
    }
}

pub fn bereich_start(language: Language, title: &str) -> String {
    match language {
        Language::De => format!("Starte Bereich: {title}"),
        Language::En => format!("Starting area: {title}"),
    }
}

pub fn bereich_complete(language: Language, title: &str) -> String {
    match language {
        Language::De => format!("Bereich abgeschlossen: {title}"),
        Language::En => format!("Area complete: {title}"),
    }
}

pub fn done(language: Language, duration_seconds: u64) -> String {
    match language {
        Language::De => format!("Recherche abgeschlossen in {duration_seconds}s"),
        Language::En => format!("Research complete in {duration_seconds}s"),
    }
}

/// Translated label for one Ask-mode stage/phase key (spec.md §4.8
/// "Ask"). Falls back to a generic word for an unrecognized key rather
/// than borrowing it, since the label must be `'static`.
fn ask_stage_label(language: Language, stage: &str) -> &'static str {
    match (language, stage) {
        (Language::De, "intent") => "Absicht",
        (Language::De, "knowledge") => "Wissenslücken",
        (Language::De, "queries") => "Suchanfragen",
        (Language::De, "answer") => "Antwort",
        (Language::De, "audit") => "Prüfung",
        (Language::De, "verification") => "Verifizierung",
        (Language::En, "intent") => "intent",
        (Language::En, "knowledge") => "knowledge gaps",
        (Language::En, "queries") => "queries",
        (Language::En, "answer") => "answer",
        (Language::En, "audit") => "audit",
        (Language::En, "verification") => "verification",
        (Language::De, _) => "Schritt",
        (Language::En, _) => "stage",
    }
}

pub fn ask_stage_start(language: Language, stage: &str) -> String {
    let label = ask_stage_label(language, stage);
    match language {
        Language::De => format!("Schritt \"{label}\" beginnt"),
        Language::En => format!("stage {label} starting"),
    }
}

pub fn ask_stage_complete(language: Language, stage: &str) -> String {
    let label = ask_stage_label(language, stage);
    match language {
        Language::De => format!("Schritt \"{label}\" abgeschlossen"),
        Language::En => format!("stage {label} complete"),
    }
}

pub fn ask_scrape_start(language: Language, phase: &str, url_count: usize) -> String {
    let label = ask_stage_label(language, phase);
    match language {
        Language::De => format!("Lade {url_count} Quellen für \"{label}\""),
        Language::En => format!("scraping {url_count} sources for {label}"),
    }
}

pub fn ask_scrape_progress(language: Language, url: &str) -> String {
    match language {
        Language::De => format!("abgerufen: {url}"),
        Language::En => format!("scraped {url}"),
    }
}

pub fn ask_scrape_done(language: Language, phase: &str, successful: usize) -> String {
    let label = ask_stage_label(language, phase);
    match language {
        Language::De => format!("Abrufphase \"{label}\" abgeschlossen ({successful} erfolgreich)"),
        Language::En => format!("scrape phase {label} done ({successful} successful)"),
    }
}

pub fn ask_done(language: Language, duration_seconds: u64) -> String {
    match language {
        Language::De => format!("Ask-Sitzung abgeschlossen in {duration_seconds}s"),
        Language::En => format!("ask session complete in {duration_seconds}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_only_changes_message_text_not_shape() {
        let de = starting(Language::De, 5);
        let en = starting(Language::En, 5);
        assert!(de.contains('5'));
        assert!(en.contains('5'));
        assert_ne!(de, en);
    }

    #[test]
    fn ask_stage_messages_vary_by_language() {
        let de = ask_stage_start(Language::De, "intent");
        let en = ask_stage_start(Language::En, "intent");
        assert_ne!(de, en);
        assert!(de.contains("Absicht"));
        assert!(en.contains("intent"));
    }
}

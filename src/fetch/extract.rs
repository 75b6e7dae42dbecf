//! Visible-text extraction from rendered HTML.
//!
//! A deliberately small replacement for the teacher's `rust_scraper`
//! pipeline (readability + domain-specific cleaning + jsonld + metadata,
//! ~3000 lines across `clean.rs`/`parse.rs`/`metadata.rs`/`jsonld.rs`):
//! the stealth/fingerprint-evasion concerns that pipeline served are out
//! of scope (spec.md §1 treats the scraper as an external collaborator),
//! so this module only needs the `navigate -> visible_text` half of the
//! contract. Grounded in the teacher's `preprocess_html` step (regex-strip
//! non-content tags before extracting text), simplified to skip the
//! readability/jsonld/domain-specific passes that served anti-bot evasion.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "form", "svg", "iframe",
];

fn noise_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = NOISE_TAGS.join("|");
        Regex::new(&format!(r"(?is)<({alternation})\b[^>]*>.*?</\1>")).unwrap()
    })
}

/// Strip script/style/nav/footer/etc. blocks, then collect the remaining
/// text nodes and collapse whitespace.
pub fn visible_text_from_html(html: &str) -> String {
    let stripped = noise_tag_regex().replace_all(html, " ");

    let document = Html::parse_document(&stripped);
    let body_sel = Selector::parse("body").unwrap();

    let text: String = match document.select(&body_sel).next() {
        Some(body) => body.text().collect::<Vec<_>>().join(" "),
        None => document.root_element().text().collect::<Vec<_>>().join(" "),
    };

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Significant-content check used by the Source Fetcher (spec.md §4.3:
/// "empty bodies (<50 significant chars) count as failures").
pub fn is_significant_content(text: &str) -> bool {
    text.trim().chars().filter(|c| !c.is_whitespace()).count() >= 50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_and_nav() {
        let html = r#"
            <html><body>
            <nav>Home | About</nav>
            <script>alert('x')</script>
            <main>Hello world, this is content.</main>
            <footer>copyright 2026</footer>
            </body></html>
        "#;
        let text = visible_text_from_html(html);
        assert!(text.contains("Hello world"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("copyright"));
        assert!(!text.contains("alert"));
    }

    #[test]
    fn empty_body_is_not_significant() {
        assert!(!is_significant_content("   \n\t  "));
        assert!(!is_significant_content("short"));
        assert!(is_significant_content(&"word ".repeat(20)));
    }
}

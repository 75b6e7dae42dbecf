//! Brave Search SERP parsing.
//!
//! Grounded on the teacher's `tools::search::engines::brave`
//! (`main`/`a`/`h3` item selectors, `p.snippet-description` /
//! `div.snippet-description` snippet selectors), simplified to the flat
//! `SearchResult` shape.

use crate::core::types::SearchResult;
use scraper::{Html, Selector};

fn normalize_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        Some(href.to_string())
    } else {
        None
    }
}

pub fn parse_results(html: &str, query: &str, max_results: usize) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let sel_item = Selector::parse("div#results > div.snippet, div.snippet").unwrap();
    let sel_link = Selector::parse("a").unwrap();
    let sel_title = Selector::parse("h3").unwrap();
    let sel_snip = Selector::parse("p.snippet-description, div.snippet-description").unwrap();

    let mut out = Vec::new();
    for item in doc.select(&sel_item) {
        if out.len() >= max_results {
            break;
        }
        let Some(link) = item.select(&sel_link).next() else {
            continue;
        };
        let href_raw = link.value().attr("href").unwrap_or("");
        let Some(url) = normalize_href(href_raw) else {
            continue;
        };
        let title = item
            .select(&sel_title)
            .next()
            .map(|n| n.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
        if title.is_empty() {
            continue;
        }
        let snippet = item
            .select(&sel_snip)
            .next()
            .map(|n| n.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        let snippet = snippet.split_whitespace().collect::<Vec<_>>().join(" ");

        out.push(SearchResult {
            query: query.to_string(),
            title,
            url,
            snippet,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_hrefs() {
        assert_eq!(normalize_href("/local/path"), None);
    }

    #[test]
    fn accepts_absolute_hrefs() {
        assert_eq!(
            normalize_href("https://example.com/x"),
            Some("https://example.com/x".to_string())
        );
    }
}

//! Google SERP parsing.
//!
//! Grounded on the teacher's `tools::search::engines::google`
//! (`normalize_google_href`, `div.VwiC3b`/`div.IsZvec`/`span.aCOpRe`
//! selectors), simplified to the flat `SearchResult` shape.

use crate::core::types::SearchResult;
use scraper::{Html, Selector};

fn normalize_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    if let Some(rest) = href.strip_prefix("/url?q=") {
        let decoded = rest.split('&').next().unwrap_or(rest);
        if let Ok(decoded) = percent_encoding::percent_decode_str(decoded).decode_utf8() {
            let decoded = decoded.to_string();
            if decoded.starts_with("http://") || decoded.starts_with("https://") {
                return Some(decoded);
            }
        }
        return None;
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        if let Ok(url) = url::Url::parse(href) {
            if matches!(url.host_str(), Some(h) if h.ends_with("google.com")) {
                return None;
            }
        }
        return Some(href.to_string());
    }

    None
}

pub fn parse_results(html: &str, query: &str, max_results: usize) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let sel_item = Selector::parse("div.MUxGbd, div.g").unwrap();
    let sel_link = Selector::parse("a[href]").unwrap();
    let sel_title = Selector::parse("h3").unwrap();
    let sel_snip = Selector::parse("div.VwiC3b, div.IsZvec, span.aCOpRe").unwrap();

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
    fn url_redirect_is_decoded() {
        assert_eq!(
            normalize_href("/url?q=https://example.com/page&sa=U"),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn google_own_links_are_rejected() {
        assert_eq!(normalize_href("https://www.google.com/preferences"), None);
    }
}

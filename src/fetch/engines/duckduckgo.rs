//! DuckDuckGo HTML-endpoint SERP parsing.
//!
//! Grounded on the teacher's `tools::search::engines::duckduckgo`
//! (`normalize_ddg_href`/`parse_results`), simplified to the flat
//! `SearchResult` shape and stripped of breadcrumb/published-at/source-type
//! classification, which belonged to the teacher's richer memory layer.

use crate::core::types::SearchResult;
use scraper::{Html, Selector};

fn normalize_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let candidate = if let Some(rest) = href.strip_prefix("//") {
        format!("https:{rest}")
    } else if let Some(rest) = href.strip_prefix('/') {
        format!("https://duckduckgo.com/{rest}")
    } else {
        href.to_string()
    };

    if let Ok(url) = url::Url::parse(&candidate) {
        if matches!(url.host_str(), Some("duckduckgo.com")) && url.path().starts_with("/l/") {
            for (k, v) in url.query_pairs() {
                if k == "uddg" && !v.trim().is_empty() {
                    return Some(v.to_string());
                }
            }
        }
    }

    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Some(candidate);
    }
    None
}

pub fn parse_results(html: &str, query: &str, max_results: usize) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let sel_item = Selector::parse("div.results_links").unwrap();
    let sel_link = Selector::parse("a.result__a").unwrap();
    let sel_snip = Selector::parse("a.result__snippet, div.result__snippet").unwrap();

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
        let title = link.text().collect::<Vec<_>>().join(" ");
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
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
    fn redirect_href_is_unwrapped() {
        assert_eq!(
            normalize_href("/l/?uddg=https%3A%2F%2Fexample.com%2Farticle&rut=x"),
            Some("https://example.com/article".to_string())
        );
    }

    #[test]
    fn plain_absolute_href_passes_through() {
        assert_eq!(
            normalize_href("https://example.com/page"),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn relative_and_empty_hrefs_are_rejected() {
        assert_eq!(normalize_href(""), None);
        assert_eq!(normalize_href("javascript:void(0)"), None);
    }
}

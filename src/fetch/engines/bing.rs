//! Bing SERP parsing.
//!
//! Grounded on the teacher's `tools::search::engines::bing`
//! (`normalize_bing_href`'s `/ck/` redirect base64 decode, `b_algo` item
//! selectors), simplified to the flat `SearchResult` shape.

use crate::core::types::SearchResult;
use base64::Engine as _;
use scraper::{Html, Selector};

fn normalize_href(href: &str) -> Option<String> {
    let href = href.trim();
    if !(href.starts_with("http://") || href.starts_with("https://")) {
        return None;
    }

    let Ok(url) = url::Url::parse(href) else {
        return Some(href.to_string());
    };

    if matches!(url.host_str(), Some("www.bing.com") | Some("bing.com")) && url.path().starts_with("/ck/")
    {
        for (k, v) in url.query_pairs() {
            if k == "u" && !v.trim().is_empty() {
                let mut raw = v.to_string();
                if let Some(rest) = raw.strip_prefix("a1") {
                    raw = rest.to_string();
                }
                if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(&raw) {
                    if let Ok(decoded_str) = String::from_utf8(decoded) {
                        let decoded_str = decoded_str.trim().to_string();
                        if decoded_str.starts_with("http://") || decoded_str.starts_with("https://") {
                            return Some(decoded_str);
                        }
                    }
                }
                break;
            }
        }
    }

    Some(href.to_string())
}

pub fn parse_results(html: &str, query: &str, max_results: usize) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let sel_item = Selector::parse("li.b_algo").unwrap();
    let sel_link = Selector::parse("h2 a").unwrap();
    let sel_snip = Selector::parse("div.b_caption p").unwrap();

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
            .map(|p| p.text().collect::<Vec<_>>().join(" "))
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
    fn plain_absolute_href_passes_through() {
        assert_eq!(
            normalize_href("https://example.com/page"),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        assert_eq!(normalize_href("ftp://example.com/"), None);
    }
}

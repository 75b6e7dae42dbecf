//! Text-search engine adapters — HTML SERP scraping, one module per engine.
//!
//! Grounded directly on the teacher's `tools::search::engines::*`
//! (selector sets, href-normalization quirks per engine). Generalized
//! behind the `SearchEngine` trait so `fetch::search` can drive any of
//! them uniformly, and trimmed of the teacher's non-robot/stealth
//! fallback tier (out of scope — spec.md treats the search engine as an
//! external collaborator; a failed query just yields an empty list).

pub mod bing;
pub mod brave;
pub mod duckduckgo;
pub mod google;

use crate::core::types::SearchResult;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SearchEngine: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, client: &reqwest::Client, query: &str, max_results: usize) -> Vec<SearchResult>;
}

/// Fetch raw SERP HTML with a plausible desktop user agent. Never returns
/// an `Err` that the caller must panic on — failures bubble as `Result`
/// and the engine returns an empty result vec on any error.
pub(crate) async fn fetch_serp_html(client: &reqwest::Client, url: reqwest::Url) -> Result<String> {
    let resp = client
        .get(url)
        .header(
            "User-Agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
        )
        .header("Accept", "text/html,application/xhtml+xml")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await?;
    Ok(resp.text().await.unwrap_or_default())
}

macro_rules! engine_impl {
    ($struct_name:ident, $name:literal, $module:ident, $build_url:expr) => {
        pub struct $struct_name;

        #[async_trait::async_trait]
        impl SearchEngine for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }

            async fn search(
                &self,
                client: &reqwest::Client,
                query: &str,
                max_results: usize,
            ) -> Vec<SearchResult> {
                let url = match $build_url(query) {
                    Some(u) => u,
                    None => return Vec::new(),
                };
                let html = match fetch_serp_html(client, url).await {
                    Ok(h) => h,
                    Err(e) => {
                        tracing::warn!("engine '{}' request failed: {}", $name, e);
                        return Vec::new();
                    }
                };
                $module::parse_results(&html, query, max_results)
            }
        }
    };
}

fn ddg_url(query: &str) -> Option<reqwest::Url> {
    let mut u = reqwest::Url::parse("https://duckduckgo.com/html/").ok()?;
    u.query_pairs_mut().append_pair("q", query);
    Some(u)
}

fn bing_url(query: &str) -> Option<reqwest::Url> {
    let mut u = reqwest::Url::parse("https://www.bing.com/search").ok()?;
    u.query_pairs_mut().append_pair("q", query);
    Some(u)
}

fn google_url(query: &str) -> Option<reqwest::Url> {
    let mut u = reqwest::Url::parse("https://www.google.com/search").ok()?;
    u.query_pairs_mut().append_pair("q", query);
    u.query_pairs_mut().append_pair("hl", "en");
    Some(u)
}

fn brave_url(query: &str) -> Option<reqwest::Url> {
    let mut u = reqwest::Url::parse("https://search.brave.com/search").ok()?;
    u.query_pairs_mut().append_pair("q", query);
    Some(u)
}

engine_impl!(DuckDuckGoEngine, "duckduckgo", duckduckgo, ddg_url);
engine_impl!(BingEngine, "bing", bing, bing_url);
engine_impl!(GoogleEngine, "google", google, google_url);
engine_impl!(BraveEngine, "brave", brave, brave_url);

/// All engines in the default rotation order. `fetch::search` picks the
/// first healthy one per query — spec.md §4.3 says "each query hits one
/// text search engine" without mandating which, so we fail over in a
/// fixed order rather than fan out to all four per query.
pub fn default_engines() -> Vec<Box<dyn SearchEngine>> {
    vec![
        Box::new(DuckDuckGoEngine),
        Box::new(BraveEngine),
        Box::new(BingEngine),
        Box::new(GoogleEngine),
    ]
}

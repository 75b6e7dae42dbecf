//! Batch page scraping (spec.md §4.3, §5: SSRF-gated, sequential through
//! one shared browser session, ≥500ms inter-request delay).
//!
//! Grounded on the teacher's batch-scrape loop shape (one browser, one
//! page at a time, per-URL error capture into the response struct rather
//! than failing the whole batch) but driven through `fetch::browser`
//! instead of the teacher's stealth/CDP pipeline.

use crate::core::errors::sanitize_error;
use crate::core::types::{ScrapedPage, MAX_URLS_PER_BATCH};
use crate::fetch::browser::BrowserSession;
use crate::fetch::extract::is_significant_content;
use crate::fetch::ssrf::validate_url;
use std::collections::HashSet;
use std::time::Duration;

const INTER_REQUEST_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_NAVIGATE_TIMEOUT: Duration = Duration::from_secs(15);
const DOSSIER_NAVIGATE_TIMEOUT: Duration = Duration::from_secs(45);
const MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

/// Scrape `urls` sequentially through one browser session.
///
/// - Caps the batch to `MAX_URLS_PER_BATCH`, logging how many were dropped.
/// - Deduplicates, keeping the first occurrence.
/// - Rejects any URL that fails SSRF validation as a same-shaped failure,
///   never surfacing the raw validator reason to callers.
/// - `for_dossier` raises the per-page navigation timeout from 15s to 45s
///   (spec.md §4.3) since dossier generation reads full page text rather
///   than a quick existence check.
pub async fn scrape_batch(urls: &[String], for_dossier: bool) -> Vec<ScrapedPage> {
    let mut seen = HashSet::new();
    let mut deduped: Vec<String> = Vec::new();
    for u in urls {
        if seen.insert(u.clone()) {
            deduped.push(u.clone());
        }
    }

    if deduped.len() > MAX_URLS_PER_BATCH {
        tracing::warn!(
            "scrape batch of {} URLs exceeds cap {}, truncating",
            deduped.len(),
            MAX_URLS_PER_BATCH
        );
        deduped.truncate(MAX_URLS_PER_BATCH);
    }

    let mut results = Vec::with_capacity(deduped.len());
    let mut to_fetch = Vec::with_capacity(deduped.len());
    for url in deduped {
        if validate_url(&url) {
            to_fetch.push(url);
        } else {
            results.push(ScrapedPage {
                url,
                success: false,
                content: None,
                error: Some("URL failed safety validation".to_string()),
            });
        }
    }

    if to_fetch.is_empty() {
        return results;
    }

    let browser = match BrowserSession::launch().await {
        Ok(b) => b,
        Err(e) => {
            let msg = sanitize_error(&e.to_string());
            tracing::error!("failed to launch browser session: {}", msg);
            for url in to_fetch {
                results.push(ScrapedPage {
                    url,
                    success: false,
                    content: None,
                    error: Some(msg.clone()),
                });
            }
            return results;
        }
    };

    let timeout = if for_dossier {
        DOSSIER_NAVIGATE_TIMEOUT
    } else {
        DEFAULT_NAVIGATE_TIMEOUT
    };

    for (idx, url) in to_fetch.into_iter().enumerate() {
        if idx > 0 {
            tokio::time::sleep(INTER_REQUEST_DELAY).await;
        }
        results.push(scrape_one(&browser, url, timeout).await);
    }

    browser.close().await;
    results
}

async fn scrape_one(browser: &BrowserSession, url: String, timeout: Duration) -> ScrapedPage {
    match browser.visible_text(&url, timeout).await {
        Ok(mut text) => {
            if !is_significant_content(&text) {
                return ScrapedPage {
                    url,
                    success: false,
                    content: None,
                    error: Some("page body had no significant content".to_string()),
                };
            }
            if text.len() > MAX_RESPONSE_BYTES {
                text.truncate(MAX_RESPONSE_BYTES);
            }
            ScrapedPage {
                url,
                success: true,
                content: Some(text),
                error: None,
            }
        }
        Err(e) => ScrapedPage {
            url,
            success: false,
            content: None,
            error: Some(sanitize_error(&e.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsafe_urls_are_rejected_without_launching_a_browser() {
        let urls = vec!["http://127.0.0.1:6379/".to_string(), "http://169.254.169.254/".to_string()];
        let results = scrape_batch(&urls, false).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.success));
    }

    #[tokio::test]
    async fn batch_is_deduplicated() {
        let urls = vec![
            "http://127.0.0.1/a".to_string(),
            "http://127.0.0.1/a".to_string(),
        ];
        let results = scrape_batch(&urls, false).await;
        assert_eq!(results.len(), 1);
    }
}

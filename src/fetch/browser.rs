//! Browser discovery and headless-session bootstrap via `chromiumoxide`.
//!
//! Grounded on the teacher's `scraping::browser_manager` (executable
//! discovery order, headless flag set for container environments). The
//! stealth/anti-detection pipeline that surrounded it (`cdp.rs`,
//! `stealth.rs`) is out of scope here — spec.md §1 treats the stealth
//! browser as an external collaborator; this module only needs to satisfy
//! the `navigate(url, timeout) -> visible_text` contract in spec.md §6.

use anyhow::{anyhow, Result};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Browser;
use futures::StreamExt;
use std::path::Path;
use tracing::error;

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var.
/// 2. PATH scan for common package-manager installs.
/// 3. OS-specific well-known install paths.
pub fn find_chrome_executable() -> Option<String> {
    if let Some(p) = crate::core::config::chrome_executable_override() {
        return Some(p);
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = [
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
            "brave-browser",
            "brave",
        ];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/brave-browser",
            "/usr/local/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

pub fn native_browser_available() -> bool {
    find_chrome_executable().is_some()
}

fn build_headless_config(exe: &str) -> Result<BrowserConfig> {
    BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(Viewport {
            width: 1280,
            height: 900,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(1280, 900)
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--disable-sync")
        .arg("--disable-translate")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--hide-scrollbars")
        .arg("--mute-audio")
        .build()
        .map_err(|e| anyhow!("failed to build browser config: {}", e))
}

/// One headless browser owned exclusively by one scrape batch
/// (spec.md §5: "no two batches share a browser").
pub struct BrowserSession {
    browser: Browser,
    _handler: tokio::task::JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch() -> Result<Self> {
        let exe = find_chrome_executable().ok_or_else(|| {
            anyhow!("no Chromium-family browser found; set CHROME_EXECUTABLE")
        })?;
        let config = build_headless_config(&exe)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("failed to launch browser ({}): {}", exe, e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("CDP handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            _handler: handler_task,
        })
    }

    /// Navigate to `url`, wait for the DOM, and return the visible text.
    /// Honors `timeout`; never panics on a bad page.
    pub async fn visible_text(&self, url: &str, timeout: std::time::Duration) -> Result<String> {
        let fut = async {
            let page = self
                .browser
                .new_page(url)
                .await
                .map_err(|e| anyhow!("navigation failed: {}", e))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| anyhow!("navigation wait failed: {}", e))?;
            let html = page
                .content()
                .await
                .map_err(|e| anyhow!("failed to read page content: {}", e))?;
            Ok::<String, anyhow::Error>(super::extract::visible_text_from_html(&html))
        };

        match tokio::time::timeout(timeout, fut).await {
            Ok(inner) => inner,
            Err(_) => Err(anyhow!("navigation timed out after {:?}", timeout)),
        }
    }

    /// Close the underlying browser, bounded by a 10s timeout. If close
    /// hangs, the caller proceeds anyway with already-collected results
    /// (spec.md §4.3).
    pub async fn close(mut self) {
        let res = tokio::time::timeout(std::time::Duration::from_secs(10), self.browser.close()).await;
        match res {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!("browser close error (non-fatal): {}", e),
            Err(_) => tracing::warn!("browser close timed out after 10s, proceeding"),
        }
    }
}

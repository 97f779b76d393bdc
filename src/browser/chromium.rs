//! Chromium-based driver using chromiumoxide.

use super::{sanitize_js_string, BrowserDriver, PageDriver, WAIT_POLL_MS};
use crate::error::{HarvestError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. STAYHARVEST_CHROMIUM env
    if let Ok(p) = std::env::var("STAYHARVEST_CHROMIUM") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    if let Ok(path) = which::which("google-chrome") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium-browser") {
        return Some(path);
    }

    // 3. Common locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }
    if let Some(home) = dirs::home_dir() {
        let local = home.join(".local/bin/chromium");
        if local.exists() {
            return Some(local);
        }
    }

    None
}

/// Launch options for the Chromium session.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Explicit Chromium binary; discovered when unset.
    pub chromium_path: Option<PathBuf>,
    /// Run with a visible window instead of headless.
    pub headful: bool,
}

/// Chromium-backed browser session.
pub struct ChromiumBrowser {
    browser: Browser,
}

impl ChromiumBrowser {
    /// Launch a Chromium instance. This is the run's only hard-fatal path:
    /// without a browser there is nothing to harvest.
    pub async fn launch(opts: &LaunchOptions) -> Result<Self> {
        let chrome_path = opts
            .chromium_path
            .clone()
            .or_else(find_chromium)
            .ok_or_else(|| {
                HarvestError::Browser(
                    "Chromium not found; set STAYHARVEST_CHROMIUM or install google-chrome"
                        .to_string(),
                )
            })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        if !opts.headful {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| HarvestError::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to launch Chromium: {e}")))?;

        // Drain CDP events for the lifetime of the session
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }
}

#[async_trait]
impl BrowserDriver for ChromiumBrowser {
    async fn new_page(&self) -> Result<Box<dyn PageDriver>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(HarvestError::browser)?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn pages(&self) -> Result<Vec<Box<dyn PageDriver>>> {
        let pages = self.browser.pages().await.map_err(HarvestError::browser)?;
        Ok(pages
            .into_iter()
            .map(|page| Box::new(ChromiumPage { page }) as Box<dyn PageDriver>)
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.browser.close().await;
        Ok(())
    }
}

/// A single Chromium page.
pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<()> {
        let result = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => Err(HarvestError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(HarvestError::Timeout {
                what: format!("navigation to {url}"),
                waited_ms: timeout_ms,
            }),
        }
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let script = format!(
            "document.querySelectorAll('{}').length",
            sanitize_js_string(selector)
        );
        let value = self.eval(&script).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn click_first(&self, selector: &str) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                if (el) {{ el.click(); return true; }}
                return false;
            }})()"#,
            sanitize_js_string(selector)
        );
        Ok(self.eval(&script).await?.as_bool().unwrap_or(false))
    }

    async fn fill_first(&self, selector: &str, text: &str) -> Result<()> {
        let el = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| HarvestError::ControlNotFound {
                selector: selector.to_string(),
            })?;
        el.click().await.map_err(HarvestError::browser)?;
        el.type_str(text).await.map_err(HarvestError::browser)?;
        Ok(())
    }

    async fn press_key(&self, selector: &str, key: &str) -> Result<()> {
        let el = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| HarvestError::ControlNotFound {
                selector: selector.to_string(),
            })?;
        el.press_key(key).await.map_err(HarvestError::browser)?;
        Ok(())
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<()> {
        let script = format!("(() => {{ window.scrollBy({dx}, {dy}); return true; }})()");
        self.eval(&script).await?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        // Poll-until-predicate instead of a blind sleep; timing assumptions
        // stay at this boundary where tests can replace them.
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.count(selector).await? > 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(HarvestError::Timeout {
                    what: selector.to_string(),
                    waited_ms: timeout_ms,
                });
            }
            tokio::time::sleep(Duration::from_millis(WAIT_POLL_MS)).await;
        }
    }

    async fn eval(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| HarvestError::Browser(format!("JS evaluation failed: {e}")))?;
        result
            .into_value()
            .map_err(|e| HarvestError::Parse(format!("failed to convert JS result: {e:?}")))
    }

    async fn html(&self) -> Result<String> {
        let value = self.eval("document.documentElement.outerHTML").await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| HarvestError::Parse("page HTML was not a string".to_string()))
    }

    async fn url(&self) -> Result<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(HarvestError::browser)?
            .map(|u| u.to_string())
            .unwrap_or_default())
    }

    async fn screenshot(&self, path: &str) -> Result<()> {
        self.page
            .save_screenshot(ScreenshotParams::builder().build(), path)
            .await
            .map_err(HarvestError::browser)?;
        Ok(())
    }

    async fn settle(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}

//! Browser capability abstraction.
//!
//! Defines the [`BrowserDriver`] and [`PageDriver`] traits the pipeline is
//! written against (currently backed by Chromium via chromiumoxide). The
//! pipeline never touches a rendering engine directly, so tests drive it with
//! a scripted fake page.

pub mod chromium;

use crate::error::Result;
use async_trait::async_trait;

/// Poll interval for bounded selector waits.
pub const WAIT_POLL_MS: u64 = 250;

/// A browser session that can open and enumerate pages.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Open a fresh blank page.
    async fn new_page(&self) -> Result<Box<dyn PageDriver>>;
    /// Handles for all currently open pages, in opening order.
    async fn pages(&self) -> Result<Vec<Box<dyn PageDriver>>>;
    /// Shut the browser down.
    async fn close(&mut self) -> Result<()>;
}

/// A single browser page the pipeline can drive.
///
/// `wait_for` is the only sanctioned way to wait on page content: it polls a
/// predicate (selector presence) until a deadline instead of sleeping blind.
/// `settle` exists for DOM mutations that expose no predicate at all (lazy
/// re-sorts, animation); fakes implement it as a no-op so tests never sleep.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL, failing if it does not commit within the timeout.
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<()>;
    /// Number of elements currently matching the selector.
    async fn count(&self, selector: &str) -> Result<usize>;
    /// Click the first element matching the selector. `Ok(false)` if absent.
    async fn click_first(&self, selector: &str) -> Result<bool>;
    /// Focus the first match and type the text into it.
    async fn fill_first(&self, selector: &str, text: &str) -> Result<()>;
    /// Press a key on the first element matching the selector.
    async fn press_key(&self, selector: &str, key: &str) -> Result<()>;
    /// Scroll the viewport by the given deltas.
    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<()>;
    /// Wait until the selector matches at least one element, or time out.
    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()>;
    /// Evaluate a JS expression in the page and return its JSON value.
    async fn eval(&self, script: &str) -> Result<serde_json::Value>;
    /// Full page markup.
    async fn html(&self) -> Result<String>;
    /// Current URL (empty string if the page has none yet).
    async fn url(&self) -> Result<String>;
    /// Write a screenshot of the current viewport to `path`.
    async fn screenshot(&self, path: &str) -> Result<()>;
    /// Fixed-duration settle wait, in milliseconds.
    async fn settle(&self, ms: u64);
    /// Close this page.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Click the first element among `tags` whose text contains `text`.
///
/// CSS alone cannot match on text content, so this probes in-page. Returns
/// whether anything was clicked.
pub async fn click_by_text(page: &dyn PageDriver, tags: &str, text: &str) -> Result<bool> {
    let script = format!(
        r#"(() => {{
            const els = Array.from(document.querySelectorAll('{}'));
            const hit = els.find(e => (e.textContent || '').trim().includes('{}'));
            if (hit) {{ hit.click(); return true; }}
            return false;
        }})()"#,
        sanitize_js_string(tags),
        sanitize_js_string(text)
    );
    Ok(page.eval(&script).await?.as_bool().unwrap_or(false))
}

/// Trimmed text content of the first element matching the selector.
pub async fn text_first(page: &dyn PageDriver, selector: &str) -> Result<Option<String>> {
    let script = format!(
        r#"(() => {{
            const el = document.querySelector('{}');
            return el ? (el.textContent || '').trim() : null;
        }})()"#,
        sanitize_js_string(selector)
    );
    Ok(page
        .eval(&script)
        .await?
        .as_str()
        .map(|s| s.to_string()))
}

/// Sanitize a string for safe injection into a JavaScript string literal.
///
/// Escapes everything that could break out of a JS string context:
/// backslashes, quotes, backticks, newlines, angle brackets, null bytes.
pub fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize_js_string("hello"), "hello");
        assert_eq!(sanitize_js_string("it's"), "it\\'s");
        assert_eq!(sanitize_js_string("a\"b"), "a\\\"b");
    }

    #[test]
    fn test_sanitize_script_breakout() {
        let malicious = r#"</script><script>alert(1)</script>"#;
        let sanitized = sanitize_js_string(malicious);
        assert!(!sanitized.contains("</script>"));
        assert!(sanitized.contains("\\x3c/script\\x3e"));
    }

    #[test]
    fn test_sanitize_selector_passthrough() {
        // Attribute selectors must survive untouched apart from quotes
        let sel = "label[data-element-value='4']";
        assert_eq!(
            sanitize_js_string(sel),
            "label[data-element-value=\\'4\\']"
        );
    }

    #[test]
    fn test_sanitize_null_bytes_stripped() {
        assert_eq!(sanitize_js_string("abc\0def"), "abcdef");
    }
}

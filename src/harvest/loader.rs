//! Progressive review loading on a hotel page.
//!
//! Drives the "load more" control until the loaded count reaches the target,
//! stops growing, the control disappears, or the attempt cap is hit. The
//! state machine is deliberately small: one count read and at most one click
//! per iteration.

use crate::browser::{click_by_text, PageDriver};
use crate::error::Result;
use tracing::{debug, info, warn};

/// Stop loading once this many reviews are visible.
pub const REVIEW_TARGET: usize = 2_500;
/// Hard cap on load-more iterations.
pub const MAX_LOAD_ATTEMPTS: usize = 50;

/// A fully loaded review block.
pub const REVIEW_BLOCK: &str = "div.Review-comment";
/// The review body text inside a block; used as the loaded-count probe.
pub const REVIEW_BODY: &str = "p.Review-comment-bodyText";

const LOAD_MORE_BUTTON: &str = "button.Review-paginator-button:not([disabled])";
const REVIEWS_TAB: &str = "a[data-element-name='review-score-and-count']";
const SORT_DROPDOWN: &str = "button[data-selenium='review-sort-dropdown-button']";
const SORT_MOST_RECENT: &str = "li[data-selenium='review-sort-dropdown-option-most_recent']";

const REVIEWS_SECTION_WAIT_MS: u64 = 20_000;
const LOAD_SETTLE_MS: u64 = 1_000;
const SORT_OPEN_SETTLE_MS: u64 = 500;
const SORT_SETTLE_MS: u64 = 3_000;

/// Why the loading loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Loaded count reached the target.
    ReachedTarget,
    /// Count did not grow versus the previous iteration.
    Stalled,
    /// Load-more control absent or disabled while count was still growing.
    Exhausted,
    /// Attempt cap hit before any other condition.
    AttemptCap,
}

impl LoadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadOutcome::ReachedTarget => "reached-target",
            LoadOutcome::Stalled => "stalled",
            LoadOutcome::Exhausted => "exhausted",
            LoadOutcome::AttemptCap => "attempt-cap",
        }
    }
}

/// Transient per-hotel loading state.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadState {
    pub loaded: usize,
    pub last: usize,
    pub attempts: usize,
}

/// Navigate into the reviews section if a distinct control exists.
///
/// Absence is not an error: some layouts render reviews inline.
pub async fn open_reviews_section(page: &dyn PageDriver) {
    let clicked = page.click_first(REVIEWS_TAB).await.unwrap_or(false)
        || click_by_text(page, "a", "Reviews").await.unwrap_or(false);

    if clicked {
        debug!("reviews tab clicked");
        if let Err(e) = page.wait_for(REVIEW_BLOCK, REVIEWS_SECTION_WAIT_MS).await {
            warn!("reviews section did not render in time: {e}");
        }
    } else {
        debug!("no reviews tab found; assuming section already visible");
    }
}

/// Click "load more" until a terminal condition, then settle once.
pub async fn load_all(page: &dyn PageDriver, target: usize) -> Result<(LoadOutcome, LoadState)> {
    let mut state = LoadState::default();

    let outcome = loop {
        if state.attempts >= MAX_LOAD_ATTEMPTS {
            break LoadOutcome::AttemptCap;
        }

        state.loaded = page.count(REVIEW_BODY).await?;

        if state.loaded >= target {
            break LoadOutcome::ReachedTarget;
        }
        if state.loaded == state.last {
            break LoadOutcome::Stalled;
        }
        state.last = state.loaded;

        if !page.click_first(LOAD_MORE_BUTTON).await.unwrap_or(false) {
            break LoadOutcome::Exhausted;
        }
        state.attempts += 1;
        debug!(
            attempt = state.attempts,
            loaded = state.loaded,
            "clicked load-more"
        );
        page.settle(LOAD_SETTLE_MS).await;
    };

    info!(
        outcome = outcome.as_str(),
        loaded = state.loaded,
        attempts = state.attempts,
        "review loading finished"
    );
    // Let the last batch settle into the DOM before extraction.
    page.settle(LOAD_SETTLE_MS).await;
    Ok((outcome, state))
}

/// Best-effort switch of the review sort order to most-recent-first.
///
/// Used only when a date range is active, to front-load in-range reviews.
/// Returns whether the switch was applied.
pub async fn sort_most_recent(page: &dyn PageDriver) -> bool {
    if !page.click_first(SORT_DROPDOWN).await.unwrap_or(false) {
        warn!("review sort dropdown not found");
        return false;
    }
    page.settle(SORT_OPEN_SETTLE_MS).await;

    if !page.click_first(SORT_MOST_RECENT).await.unwrap_or(false) {
        warn!("most-recent sort option not found");
        return false;
    }
    page.settle(SORT_SETTLE_MS).await;
    info!("review sort switched to most-recent-first");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Page fake that replays a scripted sequence of loaded counts.
    /// The last count repeats once the script is exhausted.
    struct CountingPage {
        counts: Mutex<Vec<usize>>,
        cursor: AtomicUsize,
        button_present: bool,
        clicks: AtomicUsize,
    }

    impl CountingPage {
        fn new(counts: Vec<usize>, button_present: bool) -> Self {
            Self {
                counts: Mutex::new(counts),
                cursor: AtomicUsize::new(0),
                button_present,
                clicks: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageDriver for CountingPage {
        async fn navigate(&self, _url: &str, _timeout_ms: u64) -> Result<()> {
            Ok(())
        }
        async fn count(&self, _selector: &str) -> Result<usize> {
            let counts = self.counts.lock().unwrap();
            let i = self.cursor.fetch_add(1, Ordering::SeqCst);
            Ok(*counts.get(i).or_else(|| counts.last()).unwrap_or(&0))
        }
        async fn click_first(&self, _selector: &str) -> Result<bool> {
            self.clicks.fetch_add(1, Ordering::SeqCst);
            Ok(self.button_present)
        }
        async fn fill_first(&self, _selector: &str, _text: &str) -> Result<()> {
            Ok(())
        }
        async fn press_key(&self, _selector: &str, _key: &str) -> Result<()> {
            Ok(())
        }
        async fn scroll_by(&self, _dx: i64, _dy: i64) -> Result<()> {
            Ok(())
        }
        async fn wait_for(&self, _selector: &str, _timeout_ms: u64) -> Result<()> {
            Ok(())
        }
        async fn eval(&self, _script: &str) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
        async fn html(&self) -> Result<String> {
            Ok(String::new())
        }
        async fn url(&self) -> Result<String> {
            Ok(String::new())
        }
        async fn screenshot(&self, _path: &str) -> Result<()> {
            Ok(())
        }
        async fn settle(&self, _ms: u64) {}
        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_loader_stops_on_first_stall() {
        // Count never changes after the first read: one click, then stall.
        let page = CountingPage::new(vec![10], true);
        let (outcome, state) = load_all(&page, REVIEW_TARGET).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Stalled);
        assert_eq!(state.loaded, 10);
        assert_eq!(state.attempts, 1);
    }

    #[tokio::test]
    async fn test_loader_stops_at_target_not_cap() {
        // Always-growing source: exits the first time count >= target.
        let counts: Vec<usize> = (1..=20).map(|i| i * 300).collect();
        let page = CountingPage::new(counts, true);
        let (outcome, state) = load_all(&page, REVIEW_TARGET).await.unwrap();
        assert_eq!(outcome, LoadOutcome::ReachedTarget);
        assert_eq!(state.loaded, 2_700);
        assert!(state.attempts < MAX_LOAD_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_loader_exhausted_when_button_gone_while_growing() {
        let page = CountingPage::new(vec![5, 12, 30], false);
        let (outcome, state) = load_all(&page, REVIEW_TARGET).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Exhausted);
        assert_eq!(state.attempts, 0);
        assert_eq!(state.loaded, 5);
    }

    #[tokio::test]
    async fn test_loader_attempt_cap_is_hard() {
        // Grows by one forever with the button present: cap must end it.
        let counts: Vec<usize> = (1..=200).collect();
        let page = CountingPage::new(counts, true);
        let (outcome, state) = load_all(&page, REVIEW_TARGET).await.unwrap();
        assert_eq!(outcome, LoadOutcome::AttemptCap);
        assert_eq!(state.attempts, MAX_LOAD_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_immediate_target() {
        let page = CountingPage::new(vec![2_600], true);
        let (outcome, state) = load_all(&page, REVIEW_TARGET).await.unwrap();
        assert_eq!(outcome, LoadOutcome::ReachedTarget);
        assert_eq!(state.attempts, 0);
        assert_eq!(page.clicks.load(Ordering::SeqCst), 0);
    }
}

//! City search submission and results-view resolution.
//!
//! Submitting a destination search can leave the results in the originating
//! page or in a freshly opened tab, unpredictably. Resolution is a ranked
//! chain of probes over the open pages, tried in priority order; exhaustion
//! falls back to the originating page and the pipeline continues degraded
//! rather than aborting.

use crate::browser::{BrowserDriver, PageDriver};
use crate::error::Result;
use tracing::{debug, info, warn};

/// Booking-site entry point.
pub const BASE_URL: &str = "https://www.agoda.com";

/// Marker present on a loaded hotel-results view.
pub const HOTEL_ITEM_MARKER: &str = "div[data-selenium='hotel-item']";

const CONSENT_BUTTON: &str = "button#onetrust-accept-btn-handler";
const DESTINATION_INPUT: &str =
    "input[placeholder*='destination'], input[placeholder*='property']";
const SEARCH_BUTTON: &str = "button[data-selenium='searchButton']";

const SUGGESTION_SETTLE_MS: u64 = 2_000;
const MARKER_WAIT_MS: u64 = 5_000;

/// Which probe of the resolution chain matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedVia {
    /// The originating page showed the hotel-item marker.
    OriginMarker,
    /// Another tab with a hotel URL showed the marker.
    HotelTab,
    /// A tab whose URL matches the search-result pattern showed the marker.
    SearchUrl,
    /// Most recently opened tab that is not a known non-hotel section.
    MostRecent,
    /// Every probe failed; the originating page is used as-is.
    Fallback,
}

impl ResolvedVia {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedVia::OriginMarker => "origin-marker",
            ResolvedVia::HotelTab => "hotel-tab",
            ResolvedVia::SearchUrl => "search-url",
            ResolvedVia::MostRecent => "most-recent",
            ResolvedVia::Fallback => "fallback",
        }
    }
}

/// Fill the destination input, accept the first suggestion, trigger search.
///
/// Failure here is fatal to the run: without a submitted search there is no
/// results view to harvest from.
pub async fn submit_search(page: &dyn PageDriver, city: &str) -> Result<()> {
    // Consent banner blocks the input on first visit; dismiss best-effort.
    let _ = page.click_first(CONSENT_BUTTON).await;

    page.fill_first(DESTINATION_INPUT, city).await?;
    page.settle(SUGGESTION_SETTLE_MS).await;

    // Accept the first autocomplete suggestion.
    page.press_key(DESTINATION_INPUT, "ArrowDown").await?;
    page.press_key(DESTINATION_INPUT, "Enter").await?;
    page.settle(SUGGESTION_SETTLE_MS).await;

    // Some layouts need an explicit search click, some navigate on Enter.
    match page.click_first(SEARCH_BUTTON).await {
        Ok(true) => debug!("search button clicked"),
        _ => debug!("no search button; relying on Enter submission"),
    }

    info!(city, "search submitted");
    Ok(())
}

/// Resolve which open page now shows the hotel results.
///
/// Probes, in order:
/// 1. the originating page, if the hotel-item marker appears quickly;
/// 2. any tab whose URL looks like a hotel section (and not activities) and
///    shows the marker;
/// 3. any tab whose URL matches the search-result pattern and shows the marker;
/// 4. the most recently opened tab that is not a known non-hotel section.
///
/// Never fails: exhaustion returns the originating page, degraded.
pub async fn resolve_results_view(
    browser: &dyn BrowserDriver,
    origin: Box<dyn PageDriver>,
) -> (Box<dyn PageDriver>, ResolvedVia) {
    // 1. Results loaded in place
    if origin.wait_for(HOTEL_ITEM_MARKER, MARKER_WAIT_MS).await.is_ok() {
        info!("hotel results loaded on originating page");
        return (origin, ResolvedVia::OriginMarker);
    }

    // 2. A new tab with a hotel URL
    if let Ok(pages) = browser.pages().await {
        for page in pages {
            let url = page.url().await.unwrap_or_default();
            if !url.contains("activities")
                && url.contains("hotel")
                && page.wait_for(HOTEL_ITEM_MARKER, MARKER_WAIT_MS).await.is_ok()
            {
                info!(url, "hotel results found in new tab");
                return (page, ResolvedVia::HotelTab);
            }
        }
    }

    // 3. A tab whose URL matches the search-result pattern
    if let Ok(pages) = browser.pages().await {
        for page in pages {
            let url = page.url().await.unwrap_or_default();
            if url.contains("search?city=")
                && page.wait_for(HOTEL_ITEM_MARKER, MARKER_WAIT_MS).await.is_ok()
            {
                info!(url, "hotel results found via search URL");
                return (page, ResolvedVia::SearchUrl);
            }
        }
    }

    // 4. Newest tab that is not a known non-hotel section
    if let Ok(pages) = browser.pages().await {
        for page in pages.into_iter().rev() {
            let url = page.url().await.unwrap_or_default();
            if !url.contains("activities") {
                warn!(url, "falling back to most recently opened page");
                return (page, ResolvedVia::MostRecent);
            }
        }
    }

    warn!("could not resolve a results view; proceeding with originating page");
    (origin, ResolvedVia::Fallback)
}

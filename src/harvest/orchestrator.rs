//! End-to-end harvest run.
//!
//! Composes navigator → star filter → discovery → per-hotel loader,
//! extractor, and persister. One browser session for the whole run; one page
//! per hotel, opened and unconditionally closed around its processing. A
//! failing hotel is screenshotted, logged, and skipped — it never aborts the
//! run.

use crate::browser::{text_first, BrowserDriver, PageDriver};
use crate::dataset::DatasetPersister;
use crate::error::Result;
use crate::events::{EventBus, HarvestEvent};
use crate::harvest::criteria::SearchCriteria;
use crate::harvest::discovery::{self, HotelRecord};
use crate::harvest::extractor;
use crate::harvest::loader::{self, REVIEW_TARGET};
use crate::harvest::navigator::{self, BASE_URL};
use crate::harvest::stars;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Per-hotel review work is expensive; a run processes at most this many.
pub const HOTEL_CAP: usize = 5;

const NAV_TIMEOUT_MS: u64 = 20_000;
const HOTEL_SETTLE_MS: u64 = 3_000;

const HOTEL_NAME: &str = "h1[data-selenium='hotel-header-name']";
const HOTEL_RATING: &str = "span[data-element-name='mosaic-hotel-rating-container']";

/// What a finished run did.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub hotels_discovered: usize,
    pub hotels_processed: usize,
    pub hotels_failed: usize,
    pub rows_written: usize,
}

/// Drives one harvest run over a single browser session.
pub struct Harvester {
    browser: Box<dyn BrowserDriver>,
    persister: DatasetPersister,
    events: EventBus,
    screenshot_dir: PathBuf,
}

impl Harvester {
    pub fn new(
        browser: Box<dyn BrowserDriver>,
        persister: DatasetPersister,
        screenshot_dir: PathBuf,
    ) -> Self {
        Self {
            browser,
            persister,
            events: EventBus::default(),
            screenshot_dir,
        }
    }

    /// The run's event bus; subscribe before calling [`Harvester::run`].
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Execute the run. The browser is closed on every exit path.
    pub async fn run(mut self, criteria: &SearchCriteria) -> Result<RunSummary> {
        let result = self.run_inner(criteria).await;
        let _ = self.browser.close().await;
        result
    }

    async fn run_inner(&self, criteria: &SearchCriteria) -> Result<RunSummary> {
        let started = Instant::now();
        info!(
            city = %criteria.city,
            stars = criteria.star_rating,
            date_filter = criteria.date_range.is_some(),
            "starting harvest run"
        );
        self.events.emit(HarvestEvent::RunStarted {
            city: criteria.city.clone(),
        });

        // Session establishment — the only hard-fatal stretch of the run.
        let origin = self.browser.new_page().await?;
        origin.navigate(BASE_URL, NAV_TIMEOUT_MS).await?;
        navigator::submit_search(origin.as_ref(), &criteria.city).await?;
        self.events.emit(HarvestEvent::SearchSubmitted {
            city: criteria.city.clone(),
        });

        let (results, via) =
            navigator::resolve_results_view(self.browser.as_ref(), origin).await;
        self.events.emit(HarvestEvent::ResultsResolved {
            url: results.url().await.unwrap_or_default(),
            via: via.as_str().to_string(),
        });

        let applied = stars::apply(results.as_ref(), criteria.star_rating)
            .await
            .unwrap_or(false);
        if criteria.star_rating > 0 && !applied {
            warn!("continuing without star rating filter");
        }
        self.events.emit(HarvestEvent::StarFilter {
            stars: criteria.star_rating,
            applied,
        });

        let mut hotels = discovery::discover(results.as_ref(), &self.events).await?;
        let total = hotels.len();
        hotels.truncate(HOTEL_CAP);
        info!(total, kept = hotels.len(), "hotel discovery complete");
        self.events.emit(HarvestEvent::HotelsDiscovered {
            total,
            kept: hotels.len(),
        });

        let mut summary = RunSummary {
            hotels_discovered: total,
            ..RunSummary::default()
        };

        for (index, hotel) in hotels.iter_mut().enumerate() {
            self.events.emit(HarvestEvent::HotelStarted {
                index: index + 1,
                url: hotel.url.clone(),
            });
            match self.process_hotel(index, hotel, criteria).await {
                Ok(rows) => {
                    summary.hotels_processed += 1;
                    summary.rows_written += rows;
                }
                Err(e) => {
                    // Partial-failure isolation: skip this hotel, keep going.
                    warn!(index = index + 1, url = %hotel.url, "hotel failed: {e}");
                    summary.hotels_failed += 1;
                    self.events.emit(HarvestEvent::HotelFailed {
                        index: index + 1,
                        error: e.to_string(),
                    });
                }
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            processed = summary.hotels_processed,
            failed = summary.hotels_failed,
            rows = summary.rows_written,
            elapsed_ms,
            "harvest run complete"
        );
        self.events.emit(HarvestEvent::RunComplete {
            hotels_processed: summary.hotels_processed,
            hotels_failed: summary.hotels_failed,
            rows: summary.rows_written,
            elapsed_ms,
        });

        Ok(summary)
    }

    /// Open a fresh page for one hotel and release it on every exit path.
    async fn process_hotel(
        &self,
        index: usize,
        hotel: &mut HotelRecord,
        criteria: &SearchCriteria,
    ) -> Result<usize> {
        let page = self.browser.new_page().await?;
        let result = self
            .process_on_page(page.as_ref(), index, hotel, criteria)
            .await;

        if result.is_err() {
            let shot = self
                .screenshot_dir
                .join(format!("error_hotel_{}.png", index + 1));
            if let Err(e) = page.screenshot(&shot.to_string_lossy()).await {
                warn!("diagnostic screenshot failed: {e}");
            }
        }

        let closed = page.close().await;
        if let Err(e) = closed {
            warn!("failed to close hotel page: {e}");
        }
        result
    }

    async fn process_on_page(
        &self,
        page: &dyn PageDriver,
        index: usize,
        hotel: &mut HotelRecord,
        criteria: &SearchCriteria,
    ) -> Result<usize> {
        info!(index = index + 1, url = %hotel.url, "processing hotel");
        page.navigate(&hotel.url, NAV_TIMEOUT_MS).await?;
        page.settle(HOTEL_SETTLE_MS).await;

        loader::open_reviews_section(page).await;
        let (outcome, state) = loader::load_all(page, REVIEW_TARGET).await?;
        self.events.emit(HarvestEvent::ReviewsLoaded {
            outcome: outcome.as_str().to_string(),
            loaded: state.loaded,
            attempts: state.attempts,
        });

        if criteria.date_range.is_some() {
            let applied = loader::sort_most_recent(page).await;
            if !applied {
                warn!("extracting in default sort order");
            }
            self.events.emit(HarvestEvent::SortSwitched { applied });
        }

        // Name and rating each default independently when their selector
        // is absent.
        hotel.name = text_first(page, HOTEL_NAME)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| format!("Hotel #{}", index + 1));
        hotel.rating = text_first(page, HOTEL_RATING)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "N/A".to_string());
        info!(name = %hotel.name, rating = %hotel.rating, "hotel identity read");

        let extraction = extractor::extract(page, criteria.date_range.as_ref()).await?;
        self.events.emit(HarvestEvent::ReviewsExtracted {
            raw: extraction.raw_blocks,
            kept: extraction.records.len(),
        });

        let rows = self
            .persister
            .append(&criteria.city, hotel, &extraction.records)?;
        self.events.emit(HarvestEvent::RowsAppended {
            hotel: hotel.name.clone(),
            rows,
        });
        Ok(rows)
    }
}

//! Typed events from every pipeline stage.
//!
//! The [`EventBus`] is a `tokio::sync::broadcast` channel carrying
//! [`HarvestEvent`] values. Tests subscribe to assert on what the run decided
//! (counts, degradations, skips) instead of scraping console output. When no
//! subscribers exist, events are silently dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Every event a harvest run emits. Serialized to JSON for log shipping.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HarvestEvent {
    /// A harvest run has started.
    RunStarted { city: String },
    /// The city search was filled in and submitted.
    SearchSubmitted { city: String },
    /// The results view was resolved among the open pages.
    ResultsResolved { url: String, via: String },
    /// Outcome of the best-effort star-rating filter.
    StarFilter { stars: u8, applied: bool },
    /// One pagination step of hotel discovery finished.
    DiscoveryPage {
        page: usize,
        new: usize,
        total: usize,
    },
    /// Discovery finished; `kept` is the post-cap count handed to review work.
    HotelsDiscovered { total: usize, kept: usize },
    /// Processing of one hotel has started.
    HotelStarted { index: usize, url: String },
    /// The progressive loader finished for a hotel.
    ReviewsLoaded {
        outcome: String,
        loaded: usize,
        attempts: usize,
    },
    /// Outcome of the best-effort most-recent-first sort switch.
    SortSwitched { applied: bool },
    /// Bulk extraction finished; `kept` is post-filter.
    ReviewsExtracted { raw: usize, kept: usize },
    /// Rows were appended to the city dataset.
    RowsAppended { hotel: String, rows: usize },
    /// A hotel failed and was skipped; the run continues.
    HotelFailed { index: usize, error: String },
    /// The run finished and the browser was closed.
    RunComplete {
        hotels_processed: usize,
        hotels_failed: usize,
        rows: usize,
        elapsed_ms: u64,
    },
}

/// The central event bus for one harvest run.
pub struct EventBus {
    sender: broadcast::Sender<HarvestEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers. Silently ignores if no subscribers.
    pub fn emit(&self, event: HarvestEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<HarvestEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

//! stayharvest — hotel review harvester.
//!
//! Drives a headless Chromium through a travel-booking site: searches a
//! city, discovers hotels, progressively loads each hotel's review feed,
//! extracts and filters review records, and appends them to a per-city
//! dataset file consumed by a downstream sentiment stage.

pub mod browser;
pub mod dataset;
pub mod error;
pub mod events;
pub mod harvest;

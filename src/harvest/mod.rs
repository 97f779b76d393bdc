//! The review harvesting pipeline.
//!
//! Data flows strictly downward: orchestrator → navigator → discovery →
//! (per hotel) loader → extractor → persister.

pub mod criteria;
pub mod discovery;
pub mod extractor;
pub mod loader;
pub mod navigator;
pub mod orchestrator;
pub mod stars;

//! Error taxonomy for the harvesting pipeline.
//!
//! Every recoverable failure is a value, not a swallowed exception: the
//! orchestrator's continue-on-failure policy is a visible decision on a
//! [`HarvestError`] kind.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

/// Failure kinds the pipeline distinguishes.
///
/// `ControlNotFound` and `Timeout` are the degraded-mode kinds: callers log
/// them and continue with the corresponding feature unapplied. `Navigation`
/// and `Browser` abort the current hotel only, never the run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A UI control the pipeline wanted to drive is not present on the page.
    #[error("control not found: {selector}")]
    ControlNotFound { selector: String },

    /// A bounded wait elapsed without its predicate becoming true.
    #[error("timed out after {waited_ms}ms waiting for {what}")]
    Timeout { what: String, waited_ms: u64 },

    /// Page navigation failed outright.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Extracted content could not be parsed into the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// The underlying browser session misbehaved (CDP-level failure).
    #[error("browser error: {0}")]
    Browser(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl HarvestError {
    /// Wrap any driver-level error as a browser failure.
    pub fn browser(err: impl std::fmt::Display) -> Self {
        HarvestError::Browser(err.to_string())
    }
}

//! Best-effort star-rating filter on the results view.
//!
//! The filter control varies run to run, so lookup is an explicit ordered
//! list of probes rather than inline branching: attribute-based selectors
//! first, then a text scan over labels. Filtering is advisory — when no probe
//! matches the caller continues the run unfiltered.

use crate::browser::{click_by_text, PageDriver};
use crate::error::Result;
use tracing::{info, warn};

const FILTER_SETTLE_MS: u64 = 3_000;

/// One way of locating the star-rating control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterProbe {
    /// A CSS selector expected to match the filter label.
    Css(String),
    /// A `<label>` whose text contains the given string.
    LabelText(String),
}

/// Ordered probe list for a star rating, highest-confidence first.
pub fn probes(star_rating: u8) -> Vec<FilterProbe> {
    vec![
        FilterProbe::Css(format!(
            "label[data-element-name='search-filter-starratingwithluxury'][data-element-value='{star_rating}']"
        )),
        FilterProbe::Css(format!(
            "label[data-element-name='filter-star-rating'][data-element-value='{star_rating}']"
        )),
        FilterProbe::LabelText(format!("{star_rating} star")),
    ]
}

/// Apply the star-rating constraint. Rating 0 is a no-op success.
///
/// Returns whether any probe matched and was clicked.
pub async fn apply(page: &dyn PageDriver, star_rating: u8) -> Result<bool> {
    if star_rating == 0 {
        return Ok(true);
    }

    for probe in probes(star_rating) {
        let clicked = match &probe {
            FilterProbe::Css(selector) => {
                page.count(selector).await? > 0 && page.click_first(selector).await?
            }
            FilterProbe::LabelText(text) => click_by_text(page, "label", text).await?,
        };
        if clicked {
            page.settle(FILTER_SETTLE_MS).await;
            info!(star_rating, ?probe, "star rating filter applied");
            return Ok(true);
        }
    }

    warn!(star_rating, "no star rating filter control found");
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_order_attribute_before_text() {
        let probes = probes(4);
        assert_eq!(probes.len(), 3);
        assert!(matches!(
            &probes[0],
            FilterProbe::Css(s) if s.contains("starratingwithluxury") && s.contains("'4'")
        ));
        assert!(matches!(
            &probes[1],
            FilterProbe::Css(s) if s.contains("filter-star-rating")
        ));
        assert_eq!(probes[2], FilterProbe::LabelText("4 star".to_string()));
    }
}

//! Bulk review extraction from a loaded hotel page.
//!
//! One in-page script maps every loaded review block to its text and raw
//! status line; crossing the browser boundary per element is markedly more
//! expensive, so the page is read exactly once. Refinement (trim, date
//! parse, range filter) then runs off-page.

use crate::browser::PageDriver;
use crate::error::{HarvestError, Result};
use crate::harvest::criteria::{find_review_date, DateRange};
use chrono::NaiveDate;
use serde::Deserialize;

/// Maps every `div.Review-comment` to its body text and status line.
pub const BULK_EXTRACT_JS: &str = r#"(() =>
    Array.from(document.querySelectorAll('div.Review-comment')).map(c => ({
        review: c.querySelector('p.Review-comment-bodyText')?.textContent || '',
        date_raw: c.querySelector('div.Review-statusBar-left span')?.textContent || ''
    }))
)()"#;

/// One raw block as returned by the in-page script.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReview {
    pub review: String,
    #[serde(default)]
    pub date_raw: String,
}

/// A review that survived refinement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
    /// Trimmed, non-empty review text.
    pub text: String,
    /// The matched date substring, empty when none was found.
    pub raw_date: String,
    pub parsed_date: Option<NaiveDate>,
}

/// Result of one bulk extraction.
#[derive(Debug)]
pub struct Extraction {
    /// Blocks the page returned, before any filtering.
    pub raw_blocks: usize,
    pub records: Vec<ReviewRecord>,
}

/// Refine raw blocks into records.
///
/// Empty-after-trim text drops the block outright, regardless of its date.
/// With a range active, a block survives only if its date parsed and falls
/// inside the range; with no range, date parse outcome is irrelevant.
pub fn refine(raw: Vec<RawReview>, range: Option<&DateRange>) -> Vec<ReviewRecord> {
    let mut records = Vec::new();
    for block in raw {
        let text = block.review.trim();
        if text.is_empty() {
            continue;
        }

        let (matched, parsed) = find_review_date(&block.date_raw);
        if let Some(range) = range {
            if !range.contains(parsed) {
                continue;
            }
        }

        records.push(ReviewRecord {
            text: text.to_string(),
            raw_date: matched.unwrap_or_default(),
            parsed_date: parsed,
        });
    }
    records
}

/// Perform the single bulk extraction and refine the result.
pub async fn extract(page: &dyn PageDriver, range: Option<&DateRange>) -> Result<Extraction> {
    let value = page.eval(BULK_EXTRACT_JS).await?;
    let raw: Vec<RawReview> = serde_json::from_value(value)
        .map_err(|e| HarvestError::Parse(format!("bulk review payload: {e}")))?;
    let raw_blocks = raw.len();
    let records = refine(raw, range);
    Ok(Extraction {
        raw_blocks,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(review: &str, date_raw: &str) -> RawReview {
        RawReview {
            review: review.to_string(),
            date_raw: date_raw.to_string(),
        }
    }

    fn march_2024() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1),
            NaiveDate::from_ymd_opt(2024, 3, 31),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_text_dropped_regardless_of_date() {
        let range = march_2024();
        let records = refine(
            vec![
                block("great stay", "Reviewed March 1, 2024"),
                block("", "Reviewed April 2, 2024"),
                block("   ", "Reviewed March 15, 2024"),
            ],
            Some(&range),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "great stay");
        assert_eq!(records[0].raw_date, "March 1, 2024");
    }

    #[test]
    fn test_unparsable_date_dropped_only_when_filter_active() {
        let raw = vec![block("decent room", "verified stay, no date shown")];

        let range = march_2024();
        assert!(refine(raw.clone(), Some(&range)).is_empty());

        let records = refine(raw, None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_date, "");
        assert!(records[0].parsed_date.is_none());
    }

    #[test]
    fn test_range_filters_out_of_range_dates() {
        let range = march_2024();
        let records = refine(
            vec![
                block("in range", "Reviewed March 31, 2024"),
                block("too late", "Reviewed April 1, 2024"),
                block("too early", "Reviewed February 29, 2024"),
            ],
            Some(&range),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "in range");
    }

    #[test]
    fn test_no_range_keeps_all_nonempty_in_order() {
        let records = refine(
            vec![
                block("first", "Reviewed January 5, 2020"),
                block("second", ""),
                block("third", "Reviewed December 31, 2099"),
            ],
            None,
        );
        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_text_is_trimmed() {
        let records = refine(vec![block("  lovely pool  \n", "")], None);
        assert_eq!(records[0].text, "lovely pool");
    }
}

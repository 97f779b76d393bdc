//! Run criteria: city, star rating, optional review-date range.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Textual date form the calling layer supplies (`14-08-2023`).
pub const INPUT_DATE_FORMAT: &str = "%d-%m-%Y";

/// Month-name date form found in review status lines (`August 14, 2023`).
pub const REVIEW_DATE_FORMAT: &str = "%B %d, %Y";

static REVIEW_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},\s+\d{4}",
    )
    .expect("review date pattern is valid")
});

/// An inclusive calendar-date range; at least one bound is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Build a range when at least one bound is present.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        if start.is_none() && end.is_none() {
            None
        } else {
            Some(Self { start, end })
        }
    }

    /// Whether a parsed review date falls inside this range.
    ///
    /// A review with no parsable date never matches: when filtering is
    /// active, "date unknown" excludes the record.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else {
            return false;
        };
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}

/// Immutable criteria for one harvest run.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub city: String,
    /// 0 means no star filter; otherwise 1..=5.
    pub star_rating: u8,
    pub date_range: Option<DateRange>,
}

impl SearchCriteria {
    pub fn new(city: impl Into<String>, star_rating: u8, date_range: Option<DateRange>) -> Self {
        Self {
            city: city.into(),
            star_rating,
            date_range,
        }
    }

    /// City key used in output file names: lowercased, spaces to underscores.
    pub fn sanitized_city(&self) -> String {
        self.city.to_lowercase().replace(' ', "_")
    }
}

/// Parse a caller-supplied `DD-MM-YYYY` date.
pub fn parse_input_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, INPUT_DATE_FORMAT)
}

/// Find a month-name date substring in a raw review status line.
///
/// Returns the matched substring and its parsed date. Parsing is a partial
/// function: no match, or a match chrono rejects, yields `None` for the date.
pub fn find_review_date(raw: &str) -> (Option<String>, Option<NaiveDate>) {
    match REVIEW_DATE_RE.find(raw) {
        Some(m) => {
            let text = m.as_str().to_string();
            let parsed = NaiveDate::parse_from_str(&text, REVIEW_DATE_FORMAT).ok();
            (Some(text), parsed)
        }
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_range_both_bounds_inclusive() {
        let range = DateRange::new(Some(d(2024, 3, 1)), Some(d(2024, 3, 31))).unwrap();
        assert!(range.contains(Some(d(2024, 3, 1))));
        assert!(range.contains(Some(d(2024, 3, 15))));
        assert!(range.contains(Some(d(2024, 3, 31))));
        assert!(!range.contains(Some(d(2024, 2, 29))));
        assert!(!range.contains(Some(d(2024, 4, 1))));
    }

    #[test]
    fn test_range_one_sided() {
        let from = DateRange::new(Some(d(2024, 1, 1)), None).unwrap();
        assert!(from.contains(Some(d(2030, 6, 1))));
        assert!(!from.contains(Some(d(2023, 12, 31))));

        let until = DateRange::new(None, Some(d(2024, 1, 1))).unwrap();
        assert!(until.contains(Some(d(1999, 1, 1))));
        assert!(!until.contains(Some(d(2024, 1, 2))));
    }

    #[test]
    fn test_range_unknown_date_never_matches() {
        let range = DateRange::new(Some(d(2024, 1, 1)), Some(d(2024, 12, 31))).unwrap();
        assert!(!range.contains(None));
    }

    #[test]
    fn test_range_requires_a_bound() {
        assert!(DateRange::new(None, None).is_none());
    }

    #[test]
    fn test_find_review_date_parses_month_name_form() {
        let (text, date) = find_review_date("Reviewed August 14, 2023");
        assert_eq!(text.as_deref(), Some("August 14, 2023"));
        assert_eq!(date, Some(d(2023, 8, 14)));
    }

    #[test]
    fn test_find_review_date_partial_function() {
        let (text, date) = find_review_date("no date here");
        assert!(text.is_none());
        assert!(date.is_none());

        // Pattern match that chrono rejects: day out of range
        let (text, date) = find_review_date("Stayed February 31, 2023");
        assert_eq!(text.as_deref(), Some("February 31, 2023"));
        assert!(date.is_none());
    }

    #[test]
    fn test_review_date_roundtrip() {
        let (text, date) = find_review_date("Reviewed March 1, 2024 · Couple");
        let date = date.unwrap();
        assert_eq!(format!("{}", date.format("%B %-d, %Y")), text.unwrap());
    }

    #[test]
    fn test_parse_input_date() {
        assert_eq!(parse_input_date("14-08-2023").unwrap(), d(2023, 8, 14));
        assert!(parse_input_date("2023-08-14").is_err());
    }

    #[test]
    fn test_sanitized_city() {
        let criteria = SearchCriteria::new("Kuala Lumpur", 0, None);
        assert_eq!(criteria.sanitized_city(), "kuala_lumpur");
    }
}

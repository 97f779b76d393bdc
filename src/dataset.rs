//! Per-city dataset persistence.
//!
//! One delimited file per city, append-only across and between runs. The
//! fixed column set and UTF-8 encoding are the contract with the downstream
//! classification stage; the header is written exactly once, when the file
//! is first created.

use crate::error::Result;
use crate::harvest::discovery::HotelRecord;
use crate::harvest::extractor::ReviewRecord;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

/// The stable column set consumed downstream.
pub const DATASET_COLUMNS: [&str; 6] = [
    "city",
    "hotel_name",
    "hotel_id",
    "rating",
    "review",
    "review_date",
];

/// One persisted row: the flattened join of city, hotel, and review.
#[derive(Debug, Serialize)]
struct DatasetRow<'a> {
    city: &'a str,
    hotel_name: &'a str,
    hotel_id: &'a str,
    rating: &'a str,
    review: &'a str,
    review_date: &'a str,
}

/// Appends hotel review batches to the per-city dataset file.
pub struct DatasetPersister {
    path: PathBuf,
}

impl DatasetPersister {
    /// Persister for a city; `sanitized_city` is the lowercased,
    /// underscore-joined form from [`SearchCriteria::sanitized_city`].
    ///
    /// [`SearchCriteria::sanitized_city`]: crate::harvest::criteria::SearchCriteria::sanitized_city
    pub fn for_city(output_dir: &Path, sanitized_city: &str) -> Self {
        Self {
            path: output_dir.join(format!("agoda_{sanitized_city}_hotel_reviews.csv")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one hotel's reviews, in extraction order. Writes the header
    /// first if the file does not exist yet. No row deduplication.
    pub fn append(
        &self,
        city: &str,
        hotel: &HotelRecord,
        reviews: &[ReviewRecord],
    ) -> Result<usize> {
        if reviews.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let existed = self.path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if !existed {
            writer.write_record(DATASET_COLUMNS)?;
        }

        for review in reviews {
            writer.serialize(DatasetRow {
                city,
                hotel_name: &hotel.name,
                hotel_id: &hotel.id,
                rating: &hotel.rating,
                review: &review.text,
                review_date: &review.raw_date,
            })?;
        }
        writer.flush()?;

        info!(
            hotel = %hotel.name,
            rows = reviews.len(),
            file = %self.path.display(),
            "reviews appended"
        );
        Ok(reviews.len())
    }
}

//! Dataset loading: CSV review table → validated, immutable `ReviewTable`
//!
//! The loader:
//! - Requires the columns `review, rating, sentiment, topic, aspect, aspect_index,
//!   company, data_source, time` (extra columns are ignored)
//! - Treats empty / whitespace-only cells as missing values
//! - Parses `time` and derives `year` and `month` (`YYYY-MM`) from it
//! - Fails on the first row with a missing or unparsable timestamp or rating
//!
//! Once loaded, the table is never mutated. Callers share it behind an `Arc`.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::mean_rating;
use crate::models::{FilterField, Review};

/// Columns every dataset must provide.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "review",
    "rating",
    "sentiment",
    "topic",
    "aspect",
    "aspect_index",
    "company",
    "data_source",
    "time",
];

/// Timestamp layouts accepted without an explicit UTC offset.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Date-only layouts; these resolve to midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Dataset loading errors
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to open dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: unparsable timestamp {value:?}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("row {row}: unparsable rating {value:?}")]
    InvalidRating { row: usize, value: String },

    #[error("row {row}: review has no company")]
    MissingCompany { row: usize },
}

/// Row as it appears in the file, before validation.
#[derive(Debug, Deserialize)]
struct RawReview {
    review: Option<String>,
    rating: Option<String>,
    sentiment: Option<String>,
    topic: Option<String>,
    aspect: Option<String>,
    aspect_index: Option<String>,
    company: Option<String>,
    data_source: Option<String>,
    time: Option<String>,
}

impl RawReview {
    /// `row` is 1-based and counts data rows only.
    fn validate(self, row: usize) -> Result<Review, DatasetError> {
        let time_raw = present(self.time).unwrap_or_default();
        let time = parse_timestamp(&time_raw).ok_or(DatasetError::InvalidTimestamp {
            row,
            value: time_raw.clone(),
        })?;

        let rating_raw = present(self.rating).unwrap_or_default();
        let rating = rating_raw
            .parse::<f64>()
            .ok()
            .filter(|r| !r.is_nan())
            .ok_or(DatasetError::InvalidRating {
                row,
                value: rating_raw.clone(),
            })?;

        let company = present(self.company).ok_or(DatasetError::MissingCompany { row })?;

        Ok(Review {
            review: present(self.review),
            rating,
            sentiment: present(self.sentiment),
            topic: present(self.topic),
            aspect: present(self.aspect),
            aspect_index: present(self.aspect_index),
            company,
            data_source: present(self.data_source),
            year: time.year(),
            month: time.format("%Y-%m").to_string(),
            time,
        })
    }
}

/// Trim a cell; empty means missing.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a review timestamp. Offset-bearing timestamps keep their local wall-clock time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ============================================================================
// ReviewTable
// ============================================================================

/// Immutable, validated snapshot of the review dataset.
#[derive(Debug, Clone, Default)]
pub struct ReviewTable {
    records: Vec<Review>,
}

/// Inclusive range of review years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

/// Key metrics shown at the top of the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_reviews: usize,
    pub app_count: usize,
    pub average_rating: Option<f64>,
    pub year_range: Option<YearRange>,
    /// `"min ~ max"`, as displayed
    pub year_range_label: Option<String>,
    pub sample: Vec<Review>,
}

impl ReviewTable {
    pub fn new(records: Vec<Review>) -> Self {
        Self { records }
    }

    /// Load a CSV dataset from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            rows = table.len(),
            "Loaded review dataset"
        );
        Ok(table)
    }

    /// Load a CSV dataset from any reader (file, upload body, test string).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(DatasetError::MissingColumn(column.to_string()));
            }
        }

        let mut records = Vec::new();
        for (i, result) in reader.deserialize::<RawReview>().enumerate() {
            let raw = result?;
            records.push(raw.validate(i + 1)?);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[Review] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First `n` records in file order.
    pub fn head(&self, n: usize) -> &[Review] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn summary(&self, sample_rows: usize) -> DatasetSummary {
        let app_count = self
            .records
            .iter()
            .map(|r| r.company.as_str())
            .collect::<HashSet<_>>()
            .len();

        let year_range = self
            .records
            .iter()
            .map(|r| r.year)
            .min()
            .zip(self.records.iter().map(|r| r.year).max())
            .map(|(min, max)| YearRange { min, max });

        DatasetSummary {
            total_reviews: self.records.len(),
            app_count,
            average_rating: mean_rating(&self.records),
            year_range,
            year_range_label: year_range.map(|r| format!("{} ~ {}", r.min, r.max)),
            sample: self.head(sample_rows).to_vec(),
        }
    }

    /// Observed non-missing values of `field`, in order of first appearance.
    pub fn distinct_values(&self, field: FilterField) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter_map(|r| field.value(r))
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect()
    }

    /// Records whose `field` equals `value` exactly.
    pub fn filter_by(&self, field: FilterField, value: &str) -> Vec<&Review> {
        self.records
            .iter()
            .filter(|r| field.value(r) == Some(value))
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

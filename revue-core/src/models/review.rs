use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Sentiment label that excludes a review from issue-level analysis.
pub const POSITIVE_SENTIMENT: &str = "Positive";

/// One validated row of the review dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review: Option<String>,
    pub rating: f64,
    pub sentiment: Option<String>,
    pub topic: Option<String>,
    pub aspect: Option<String>,
    pub aspect_index: Option<String>,
    pub company: String,
    pub data_source: Option<String>,
    pub time: NaiveDateTime,
    pub year: i32,
    /// `YYYY-MM`
    pub month: String,
}

impl Review {
    /// A missing sentiment counts as not positive.
    pub fn is_positive(&self) -> bool {
        self.sentiment.as_deref() == Some(POSITIVE_SENTIMENT)
    }
}

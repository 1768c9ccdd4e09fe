use serde::{Deserialize, Serialize};

use crate::models::{CategoryField, FilterField};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DashboardRequest {
    Ping,
    Summary {
        sample_rows: Option<usize>,
    },
    AverageRating {
        field: CategoryField,
    },
    FilterValues {
        field: FilterField,
    },
    FilterReviews {
        field: FilterField,
        value: String,
    },
    Trends {
        field: FilterField,
        value: String,
    },
    Issues,
    SampleReview {
        aspect: String,
        seed: Option<u64>,
    },
    Recommend {
        review: String,
    },
    RecommendForIssue {
        aspect: String,
        seed: Option<u64>,
    },
    Topics,
    TopicIssues {
        topic: String,
        samples_per_issue: Option<usize>,
        seed: Option<u64>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub version: String,
}

impl DashboardResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(serde_json::json!({"pong": true}))
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

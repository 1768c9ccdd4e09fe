//! Categorical fields a dashboard user can pick from a dropdown.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Review;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown field '{field}', expected one of: {allowed}")]
pub struct UnknownFieldError {
    pub field: String,
    pub allowed: String,
}

/// Fields the rating aggregator may group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryField {
    Sentiment,
    Topic,
    Company,
    Year,
    DataSource,
}

impl CategoryField {
    pub const ALL: [CategoryField; 5] = [
        CategoryField::Sentiment,
        CategoryField::Topic,
        CategoryField::Company,
        CategoryField::Year,
        CategoryField::DataSource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryField::Sentiment => "sentiment",
            CategoryField::Topic => "topic",
            CategoryField::Company => "company",
            CategoryField::Year => "year",
            CategoryField::DataSource => "data_source",
        }
    }

    /// Grouping key of a review for this field; `None` when the value is missing.
    pub fn key(&self, review: &Review) -> Option<GroupKey> {
        match self {
            CategoryField::Sentiment => review.sentiment.clone().map(GroupKey::Label),
            CategoryField::Topic => review.topic.clone().map(GroupKey::Label),
            CategoryField::Company => Some(GroupKey::Label(review.company.clone())),
            CategoryField::Year => Some(GroupKey::Year(review.year)),
            CategoryField::DataSource => review.data_source.clone().map(GroupKey::Label),
        }
    }
}

impl fmt::Display for CategoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryField::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| UnknownFieldError {
                field: s.to_string(),
                allowed: CategoryField::ALL.map(|f| f.as_str()).join(", "),
            })
    }
}

/// Fields the trend view may filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Topic,
    Company,
}

impl FilterField {
    pub const ALL: [FilterField; 2] = [FilterField::Topic, FilterField::Company];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Topic => "topic",
            FilterField::Company => "company",
        }
    }

    pub fn value<'a>(&self, review: &'a Review) -> Option<&'a str> {
        match self {
            FilterField::Topic => review.topic.as_deref(),
            FilterField::Company => Some(review.company.as_str()),
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterField::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| UnknownFieldError {
                field: s.to_string(),
                allowed: FilterField::ALL.map(|f| f.as_str()).join(", "),
            })
    }
}

/// Distinct value of a grouping field. Years order numerically, labels lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupKey {
    Year(i32),
    Label(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Year(y) => write!(f, "{}", y),
            GroupKey::Label(l) => f.write_str(l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_field_round_trips_through_str() {
        for field in CategoryField::ALL {
            assert_eq!(field.as_str().parse::<CategoryField>().unwrap(), field);
        }
    }

    #[test]
    fn test_unknown_category_field_lists_allowed_values() {
        let err = "rating".parse::<CategoryField>().unwrap_err();
        assert_eq!(err.field, "rating");
        assert!(err.allowed.contains("data_source"));
    }

    #[test]
    fn test_filter_field_only_accepts_topic_and_company() {
        assert_eq!("company".parse::<FilterField>().unwrap(), FilterField::Company);
        assert!("sentiment".parse::<FilterField>().is_err());
    }

    #[test]
    fn test_year_keys_order_numerically() {
        let mut keys = vec![GroupKey::Year(2021), GroupKey::Year(999), GroupKey::Year(2020)];
        keys.sort();
        assert_eq!(
            keys,
            vec![GroupKey::Year(999), GroupKey::Year(2020), GroupKey::Year(2021)]
        );
    }

    #[test]
    fn test_group_key_serializes_untagged() {
        assert_eq!(serde_json::to_value(GroupKey::Year(2020)).unwrap(), 2020);
        assert_eq!(
            serde_json::to_value(GroupKey::Label("Spotify".into())).unwrap(),
            "Spotify"
        );
    }
}

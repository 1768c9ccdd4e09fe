//! Yearly and recent-monthly rating trends for a filtered subset of reviews

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::Review;

/// Mean rating for one period of a trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint<K> {
    pub period: K,
    pub average_rating: f64,
    pub review_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTrends {
    pub yearly: Vec<TrendPoint<i32>>,
    /// Only the most recent months, oldest first
    pub monthly: Vec<TrendPoint<String>>,
}

impl RatingTrends {
    pub fn is_empty(&self) -> bool {
        self.yearly.is_empty() && self.monthly.is_empty()
    }
}

/// Both trend lines for `subset`.
pub fn build_trends(subset: &[&Review], recent_months: usize) -> RatingTrends {
    RatingTrends {
        yearly: yearly_trend(subset),
        monthly: monthly_trend(subset, recent_months),
    }
}

/// Mean rating per year, ordered by year.
pub fn yearly_trend(subset: &[&Review]) -> Vec<TrendPoint<i32>> {
    group_means(subset.iter().map(|r| (r.year, r.rating)))
}

/// Mean rating per `YYYY-MM` month for the `recent_months` latest distinct months.
///
/// `YYYY-MM` strings sort chronologically, so "latest" is the lexicographic tail.
/// Fewer distinct months than `recent_months` returns all of them.
pub fn monthly_trend(subset: &[&Review], recent_months: usize) -> Vec<TrendPoint<String>> {
    let months: BTreeSet<&str> = subset.iter().map(|r| r.month.as_str()).collect();
    let skip = months.len().saturating_sub(recent_months);
    let latest: BTreeSet<&str> = months.into_iter().skip(skip).collect();

    group_means(
        subset
            .iter()
            .filter(|r| latest.contains(r.month.as_str()))
            .map(|r| (r.month.clone(), r.rating)),
    )
}

fn group_means<K: Ord>(points: impl Iterator<Item = (K, f64)>) -> Vec<TrendPoint<K>> {
    let mut groups: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for (key, rating) in points {
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += rating;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(period, (sum, count))| TrendPoint {
            period,
            average_rating: sum / count as f64,
            review_count: count,
        })
        .collect()
}

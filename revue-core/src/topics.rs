//! Topic-based issue breakdown
//!
//! Works on the non-positive reviews that carry both a topic and an aspect.
//! Topics and aspects are listed in order of first appearance.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::aggregate::mean_rating;
use crate::dataset::ReviewTable;
use crate::models::Review;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicOverview {
    pub topic: String,
    pub review_count: usize,
    pub average_rating: f64,
    /// Share of all issue reviews, 0–100
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSample {
    pub review: Option<String>,
    pub rating: f64,
    pub aspect_index: Option<String>,
}

/// One aspect within a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueBreakdown {
    /// 1-based position within the topic
    pub number: usize,
    pub aspect: String,
    pub review_count: usize,
    /// Share of the topic's reviews, 0–100
    pub percentage: f64,
    pub average_rating: f64,
    pub samples: Vec<IssueSample>,
}

fn issue_reviews(table: &ReviewTable) -> impl Iterator<Item = &Review> {
    table
        .records()
        .iter()
        .filter(|r| !r.is_positive() && r.topic.is_some() && r.aspect.is_some())
}

/// Group `reviews` by `key`, keeping first-appearance order.
fn group_in_order<'a, F>(reviews: impl Iterator<Item = &'a Review>, key: F) -> Vec<(String, Vec<&'a Review>)>
where
    F: Fn(&Review) -> Option<&str>,
{
    let mut groups: Vec<(String, Vec<&'a Review>)> = Vec::new();
    for review in reviews {
        let Some(k) = key(review) else { continue };
        match groups.iter_mut().find(|(name, _)| name == k) {
            Some((_, members)) => members.push(review),
            None => groups.push((k.to_string(), vec![review])),
        }
    }
    groups
}

pub fn topic_overview(table: &ReviewTable) -> Vec<TopicOverview> {
    let groups = group_in_order(issue_reviews(table), |r| r.topic.as_deref());
    let total: usize = groups.iter().map(|(_, members)| members.len()).sum();

    groups
        .into_iter()
        .map(|(topic, members)| TopicOverview {
            review_count: members.len(),
            average_rating: mean_rating(members.iter().copied()).unwrap_or_default(),
            percentage: members.len() as f64 / total as f64 * 100.0,
            topic,
        })
        .collect()
}

/// Aspect breakdown of `topic` with up to `samples_per_issue` reviews sampled
/// without replacement per aspect. Unknown topics give an empty list.
pub fn topic_issues<R: Rng + ?Sized>(
    table: &ReviewTable,
    topic: &str,
    samples_per_issue: usize,
    rng: &mut R,
) -> Vec<IssueBreakdown> {
    let in_topic: Vec<&Review> = issue_reviews(table)
        .filter(|r| r.topic.as_deref() == Some(topic))
        .collect();
    let total = in_topic.len();

    group_in_order(in_topic.into_iter(), |r| r.aspect.as_deref())
        .into_iter()
        .enumerate()
        .map(|(i, (aspect, members))| {
            let amount = samples_per_issue.min(members.len());
            let samples = index::sample(rng, members.len(), amount)
                .into_iter()
                .map(|idx| IssueSample {
                    review: members[idx].review.clone(),
                    rating: members[idx].rating,
                    aspect_index: members[idx].aspect_index.clone(),
                })
                .collect();

            IssueBreakdown {
                number: i + 1,
                review_count: members.len(),
                percentage: members.len() as f64 / total as f64 * 100.0,
                average_rating: mean_rating(members.iter().copied()).unwrap_or_default(),
                aspect,
                samples,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::review::fixtures::review;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn issue(text: &str, rating: f64, topic: &str, aspect: &str) -> Review {
        let mut r = review(text, rating, "2021-03-01");
        r.topic = Some(topic.to_string());
        r.aspect = Some(aspect.to_string());
        r.aspect_index = Some(format!("{}-1", aspect));
        r
    }

    fn table() -> ReviewTable {
        let mut praise = issue("great", 5.0, "ui", "layout");
        praise.sentiment = Some("Positive".into());
        let mut untagged = issue("meh", 3.0, "ui", "layout");
        untagged.aspect = None;

        ReviewTable::new(vec![
            issue("ads everywhere", 1.0, "ads", "frequency"),
            issue("menu is confusing", 2.0, "ui", "navigation"),
            issue("too many ads", 2.0, "ads", "frequency"),
            issue("ad volume loud", 3.0, "ads", "volume"),
            praise,
            untagged,
        ])
    }

    // ========================================================================
    // TEST 1: overview counts only non-positive reviews with topic and aspect
    // ========================================================================
    #[test]
    fn test_topic_overview() {
        let overview = topic_overview(&table());

        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].topic, "ads");
        assert_eq!(overview[0].review_count, 3);
        assert!((overview[0].average_rating - 2.0).abs() < 1e-9);
        assert!((overview[0].percentage - 75.0).abs() < 1e-9);
        assert_eq!(overview[1].topic, "ui");
        assert_eq!(overview[1].review_count, 1);
    }

    // ========================================================================
    // TEST 2: per-aspect breakdown within a topic
    // ========================================================================
    #[test]
    fn test_topic_issues_breakdown() {
        let mut rng = StdRng::seed_from_u64(42);
        let issues = topic_issues(&table(), "ads", 3, &mut rng);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].number, 1);
        assert_eq!(issues[0].aspect, "frequency");
        assert_eq!(issues[0].review_count, 2);
        assert!((issues[0].percentage - 200.0 / 3.0).abs() < 1e-9);
        assert!((issues[0].average_rating - 1.5).abs() < 1e-9);
        assert_eq!(issues[0].samples.len(), 2, "samples capped by review count");
        assert_eq!(issues[1].number, 2);
        assert_eq!(issues[1].samples.len(), 1);
        assert_eq!(issues[1].samples[0].aspect_index.as_deref(), Some("volume-1"));
    }

    #[test]
    fn test_samples_are_distinct_and_seeded() {
        let records: Vec<Review> = (0..10)
            .map(|i| issue(&format!("review {}", i), 2.0, "ads", "frequency"))
            .collect();
        let table = ReviewTable::new(records);

        let a = topic_issues(&table, "ads", 3, &mut StdRng::seed_from_u64(9));
        let b = topic_issues(&table, "ads", 3, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);

        let mut texts: Vec<_> = a[0].samples.iter().map(|s| s.review.clone()).collect();
        assert_eq!(texts.len(), 3);
        texts.sort();
        texts.dedup();
        assert_eq!(texts.len(), 3, "sampled without replacement");
    }

    #[test]
    fn test_unknown_topic_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(topic_issues(&table(), "billing", 3, &mut rng).is_empty());
        assert!(topic_overview(&ReviewTable::default()).is_empty());
    }
}

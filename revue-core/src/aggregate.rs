//! Rating aggregation by categorical field

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{CategoryField, GroupKey, Review};

/// Mean rating of one observed value of a grouping field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingGroup {
    pub key: GroupKey,
    pub average_rating: f64,
    pub review_count: usize,
    /// Share of reviews that have a value for the field, 0–100
    pub percentage: f64,
}

/// Arithmetic mean of the ratings, `None` for an empty input.
pub fn mean_rating<'a, I>(reviews: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Review>,
{
    let (sum, count) = reviews
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.rating, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Group reviews by `field` and return the groups sorted ascending by mean rating.
///
/// Reviews with a missing value for `field` are skipped, so only observed values
/// produce a group. Groups with equal means keep key order.
pub fn average_rating_by<'a, I>(reviews: I, field: CategoryField) -> Vec<RatingGroup>
where
    I: IntoIterator<Item = &'a Review>,
{
    let mut groups: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();
    for review in reviews {
        if let Some(key) = field.key(review) {
            let entry = groups.entry(key).or_insert((0.0, 0));
            entry.0 += review.rating;
            entry.1 += 1;
        }
    }

    let total: usize = groups.values().map(|(_, count)| count).sum();

    let mut result: Vec<RatingGroup> = groups
        .into_iter()
        .map(|(key, (sum, count))| RatingGroup {
            key,
            average_rating: sum / count as f64,
            review_count: count,
            percentage: count as f64 / total as f64 * 100.0,
        })
        .collect();

    result.sort_by(|a, b| a.average_rating.total_cmp(&b.average_rating));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::review::fixtures::review;

    // ========================================================================
    // TEST 1: year grouping sorts ascending by mean, not by year
    // ========================================================================
    #[test]
    fn test_year_groups_sorted_by_mean() {
        let reviews = vec![
            review("a", 4.0, "2020-01-01"),
            review("b", 5.0, "2020-06-01"),
            review("c", 2.0, "2021-01-01"),
            review("d", 3.0, "2021-06-01"),
        ];

        let groups = average_rating_by(&reviews, CategoryField::Year);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, GroupKey::Year(2021));
        assert!((groups[0].average_rating - 2.5).abs() < 1e-9);
        assert_eq!(groups[1].key, GroupKey::Year(2020));
        assert!((groups[1].average_rating - 4.5).abs() < 1e-9);
        assert!((groups[0].percentage - 50.0).abs() < 1e-9);
    }

    // ========================================================================
    // TEST 2: groups are exactly the observed values, means are exact
    // ========================================================================
    #[test]
    fn test_groups_match_observed_values_for_every_field() {
        let mut reviews = vec![
            review("a", 1.0, "2019-01-01"),
            review("b", 2.0, "2020-01-01"),
            review("c", 4.0, "2020-01-01"),
            review("d", 5.0, "2021-01-01"),
        ];
        reviews[0].topic = Some("ads".into());
        reviews[1].topic = Some("ui".into());
        reviews[2].topic = Some("ads".into());
        reviews[1].company = "Pandora".into();
        reviews[3].sentiment = Some("Positive".into());
        reviews[3].data_source = Some("App Store".into());

        for field in CategoryField::ALL {
            let groups = average_rating_by(&reviews, field);

            let mut expected: Vec<GroupKey> =
                reviews.iter().filter_map(|r| field.key(r)).collect();
            expected.sort();
            expected.dedup();
            let mut actual: Vec<GroupKey> = groups.iter().map(|g| g.key.clone()).collect();
            actual.sort();
            assert_eq!(actual, expected, "field {}", field);

            for group in &groups {
                let members: Vec<&Review> = reviews
                    .iter()
                    .filter(|r| field.key(r).as_ref() == Some(&group.key))
                    .collect();
                let mean = members.iter().map(|r| r.rating).sum::<f64>() / members.len() as f64;
                assert!((group.average_rating - mean).abs() < 1e-9);
                assert_eq!(group.review_count, members.len());
            }
        }
    }

    #[test]
    fn test_missing_topic_rows_do_not_form_a_group() {
        let mut reviews = vec![review("a", 1.0, "2019-01-01"), review("b", 5.0, "2019-01-01")];
        reviews[0].topic = Some("ads".into());

        let groups = average_rating_by(&reviews, CategoryField::Topic);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, GroupKey::Label("ads".into()));
        assert!((groups[0].percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_key_order() {
        let mut reviews = vec![review("a", 3.0, "2019-01-01"), review("b", 3.0, "2019-01-01")];
        reviews[0].company = "Zing".into();
        reviews[1].company = "Amp".into();

        let groups = average_rating_by(&reviews, CategoryField::Company);
        assert_eq!(groups[0].key, GroupKey::Label("Amp".into()));
        assert_eq!(groups[1].key, GroupKey::Label("Zing".into()));
    }

    #[test]
    fn test_empty_input() {
        let reviews: Vec<Review> = vec![];
        assert!(average_rating_by(&reviews, CategoryField::Sentiment).is_empty());
        assert!(mean_rating(&reviews).is_none());
    }
}

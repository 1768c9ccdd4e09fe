//! End-to-end checks against the bundled sample dataset.

use rand::rngs::StdRng;
use rand::SeedableRng;
use revue_core::recommend::{issue_options, recommend_for_issue, recommend_similar};
use revue_core::topics::{topic_issues, topic_overview};
use revue_core::trends::build_trends;
use revue_core::{average_rating_by, CategoryField, FilterField, ReviewTable, SIMILAR_REVIEW_COUNT};

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/music_sample.csv");

fn table() -> ReviewTable {
    ReviewTable::load(SAMPLE).expect("bundled sample loads")
}

#[test]
fn test_sample_loads_with_key_metrics() {
    let table = table();
    let summary = table.summary(5);
    assert_eq!(summary.total_reviews, 16);
    assert_eq!(summary.app_count, 3);
    assert_eq!(summary.year_range_label.as_deref(), Some("2020 ~ 2021"));
    assert_eq!(summary.sample.len(), 5);
}

#[test]
fn test_every_category_field_aggregates() {
    let table = table();
    for field in CategoryField::ALL {
        let groups = average_rating_by(table.records(), field);
        assert!(!groups.is_empty(), "field {}", field);
        assert!(groups
            .windows(2)
            .all(|w| w[0].average_rating <= w[1].average_rating));
    }
}

#[test]
fn test_company_trends_limit_recent_months() {
    let table = table();
    let subset = table.filter_by(FilterField::Company, "Deezer");
    let trends = build_trends(&subset, 6);
    assert_eq!(trends.yearly.len(), 1);
    assert_eq!(trends.monthly.len(), 6);
    assert_eq!(trends.monthly.last().unwrap().period, "2021-12");
}

#[test]
fn test_crash_review_recommendations() {
    let table = table();
    let similar = recommend_similar(&table, "Crashes on launch since the update").unwrap();
    assert!(similar.len() <= SIMILAR_REVIEW_COUNT);
    assert!(similar.iter().all(|s| s.review != "Crashes on launch since the update"));
    let top = similar.last().expect("at least one recommendation");
    assert!(top.review.to_lowercase().contains("crash") || top.review.contains("update"));
}

#[test]
fn test_issue_flow_and_topics() {
    let table = table();
    let options = issue_options(&table);
    assert_eq!(options[0], "crash");
    assert!(!options.contains(&"sound quality".to_string()));

    let mut rng = StdRng::seed_from_u64(2024);
    for aspect in &options {
        let result = recommend_for_issue(&table, aspect, &mut rng).unwrap();
        if let Some(found) = result {
            assert!(found.similar.iter().all(|s| !s.aspect.is_empty()));
        }
    }

    let overview = topic_overview(&table);
    assert_eq!(overview[0].topic, "performance");
    let total: f64 = overview.iter().map(|t| t.percentage).sum();
    assert!((total - 100.0).abs() < 1e-9);

    let issues = topic_issues(&table, "performance", 3, &mut rng);
    let crash = issues.iter().find(|i| i.aspect == "crash").unwrap();
    assert_eq!(crash.review_count, 3);
    assert_eq!(crash.samples.len(), 3);
}

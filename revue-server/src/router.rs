use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use revue_core::ipc::{DashboardRequest, DashboardResponse};
use revue_core::{recommend, topics, trends, RevueConfig, ReviewTable};
use serde::Serialize;

/// Everything a request may read. The table is never mutated after load.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub table: Arc<ReviewTable>,
    pub config: RevueConfig,
}

impl DashboardContext {
    pub fn new(table: ReviewTable, config: RevueConfig) -> Self {
        Self {
            table: Arc::new(table),
            config,
        }
    }
}

/// Run `request` on the blocking pool; TF-IDF ranking is CPU-bound.
pub async fn dispatch(request: DashboardRequest, ctx: Arc<DashboardContext>) -> DashboardResponse {
    match tokio::task::spawn_blocking(move || handle_request(request, &ctx)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Request task failed: {}", e);
            DashboardResponse::err(format!("request task failed: {}", e))
        }
    }
}

pub fn handle_request(request: DashboardRequest, ctx: &DashboardContext) -> DashboardResponse {
    let table = ctx.table.as_ref();

    match request {
        DashboardRequest::Ping => DashboardResponse::pong(),
        DashboardRequest::Summary { sample_rows } => {
            let rows = sample_rows.unwrap_or(ctx.config.dataset.sample_rows);
            respond(table.summary(rows))
        }
        DashboardRequest::AverageRating { field } => {
            let groups = revue_core::average_rating_by(table.records(), field);
            respond(serde_json::json!({
                "field": field,
                "groups": groups,
            }))
        }
        DashboardRequest::FilterValues { field } => respond(serde_json::json!({
            "field": field,
            "values": table.distinct_values(field),
        })),
        DashboardRequest::FilterReviews { field, value } => {
            let reviews = table.filter_by(field, &value);
            respond(serde_json::json!({
                "field": field,
                "value": value,
                "count": reviews.len(),
                "reviews": reviews,
            }))
        }
        DashboardRequest::Trends { field, value } => {
            let subset = table.filter_by(field, &value);
            let trends = trends::build_trends(&subset, ctx.config.trends.recent_months);
            respond(serde_json::json!({
                "field": field,
                "value": value,
                "review_count": subset.len(),
                "yearly": trends.yearly,
                "monthly": trends.monthly,
            }))
        }
        DashboardRequest::Issues => respond(serde_json::json!({
            "issues": recommend::issue_options(table),
        })),
        DashboardRequest::SampleReview { aspect, seed } => {
            let mut rng = make_rng(seed);
            let sample = recommend::sample_review_for_issue(table, &aspect, &mut rng);
            respond(serde_json::json!({
                "aspect": aspect,
                "found": sample.is_some(),
                "review": sample,
            }))
        }
        DashboardRequest::Recommend { review } => {
            match recommend::recommend_similar(table, &review) {
                Ok(similar) => respond(serde_json::json!({
                    "review": review,
                    "similar": similar,
                })),
                Err(e) => {
                    tracing::warn!(error = %e, "Rejected recommendation request");
                    DashboardResponse::err(e.to_string())
                }
            }
        }
        DashboardRequest::RecommendForIssue { aspect, seed } => {
            let mut rng = make_rng(seed);
            match recommend::recommend_for_issue(table, &aspect, &mut rng) {
                Ok(Some(found)) => respond(found),
                Ok(None) => respond(serde_json::json!({
                    "aspect": aspect,
                    "sample_review": null,
                    "similar": [],
                    "message": "no recommendations",
                })),
                Err(e) => {
                    tracing::warn!(error = %e, aspect = %aspect, "Rejected issue recommendation");
                    DashboardResponse::err(e.to_string())
                }
            }
        }
        DashboardRequest::Topics => respond(serde_json::json!({
            "topics": topics::topic_overview(table),
        })),
        DashboardRequest::TopicIssues {
            topic,
            samples_per_issue,
            seed,
        } => {
            let per_issue = samples_per_issue.unwrap_or(ctx.config.topics.samples_per_issue);
            let mut rng = make_rng(seed);
            respond(serde_json::json!({
                "topic": topic,
                "issues": topics::topic_issues(table, &topic, per_issue, &mut rng),
            }))
        }
    }
}

/// Seeded when the caller asks for reproducible samples.
fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn respond<T: Serialize>(data: T) -> DashboardResponse {
    match serde_json::to_value(data) {
        Ok(value) => DashboardResponse::ok(value),
        Err(e) => {
            tracing::error!("Failed to serialize response data: {}", e);
            DashboardResponse::err(format!("serialization error: {}", e))
        }
    }
}

//! Revue HTTP REST API
//!
//! Axum server exposing the dashboard queries as JSON. Runs alongside the Unix
//! socket IPC server on port 8770 (configurable).
//!
//! Each endpoint has a thin axum handler that delegates to an `*_inner`
//! function, which builds a `DashboardRequest` and runs it through the router.
//!
//! Endpoints:
//! - GET  /health         : health check with dataset size
//! - GET  /version        : server version info
//! - GET  /summary        : key metrics and sample reviews
//! - POST /ratings        : mean rating by category field
//! - GET  /filters/:field : distinct values of a filter field
//! - POST /reviews        : reviews matching a filter value
//! - POST /trends         : yearly and recent-monthly trends for a filter value
//! - GET  /issues         : issue (aspect) options
//! - POST /issues/sample  : random review for an issue
//! - POST /similar        : reviews similar to a given review text
//! - POST /similar/issue  : sample an issue review and recommend similar ones
//! - GET  /topics         : topic overview
//! - POST /topics/issues  : per-aspect breakdown of one topic

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use revue_core::ipc::{DashboardRequest, DashboardResponse};
use revue_core::{CategoryField, FilterField};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::router::{self, DashboardContext};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub context: Arc<DashboardContext>,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/summary", get(summary_handler))
        .route("/ratings", post(ratings_handler))
        .route("/filters/:field", get(filters_handler))
        .route("/reviews", post(reviews_handler))
        .route("/trends", post(trends_handler))
        .route("/issues", get(issues_handler))
        .route("/issues/sample", post(issue_sample_handler))
        .route("/similar", post(similar_handler))
        .route("/similar/issue", post(similar_issue_handler))
        .route("/topics", get(topics_handler))
        .route("/topics/issues", post(topic_issues_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    context: Arc<DashboardContext>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", context.config.http.host, context.config.http.port);
    let state = Arc::new(HttpState { context });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Revue HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct SummaryQuery {
    pub sample_rows: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RatingsRequest {
    pub field: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FilterRequest {
    pub field: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct IssueRequest {
    pub aspect: Option<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SimilarRequest {
    pub review: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TopicIssuesRequest {
    pub topic: Option<String>,
    pub samples_per_issue: Option<usize>,
    pub seed: Option<u64>,
}

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            status: "error".to_string(),
        }
    }
}

fn bad_request(msg: impl Into<String>) -> (StatusCode, serde_json::Value) {
    let msg = msg.into();
    tracing::warn!("Rejected HTTP request: {}", msg);
    (
        StatusCode::BAD_REQUEST,
        serde_json::to_value(ErrorResponse::new(msg)).unwrap_or_default(),
    )
}

/// Non-empty trimmed value of a required body field.
fn required(value: Option<String>, name: &str) -> std::result::Result<String, (StatusCode, serde_json::Value)> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(bad_request(format!("{} field is required", name))),
    }
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

pub fn health_inner(ctx: &DashboardContext) -> (StatusCode, serde_json::Value) {
    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "reviews": ctx.table.len(),
            "socket": ctx.config.service.socket_path,
        }),
    )
}

/// Inner version: returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "revue/1",
    })
}

pub async fn summary_inner(
    ctx: Arc<DashboardContext>,
    query: SummaryQuery,
) -> (StatusCode, serde_json::Value) {
    run(ctx, DashboardRequest::Summary { sample_rows: query.sample_rows }).await
}

pub async fn ratings_inner(
    ctx: Arc<DashboardContext>,
    req: RatingsRequest,
) -> (StatusCode, serde_json::Value) {
    let field = match required(req.field, "field") {
        Ok(f) => f,
        Err(e) => return e,
    };
    match field.parse::<CategoryField>() {
        Ok(field) => run(ctx, DashboardRequest::AverageRating { field }).await,
        Err(e) => bad_request(e.to_string()),
    }
}

pub async fn filters_inner(ctx: Arc<DashboardContext>, field: &str) -> (StatusCode, serde_json::Value) {
    match field.parse::<FilterField>() {
        Ok(field) => run(ctx, DashboardRequest::FilterValues { field }).await,
        Err(e) => bad_request(e.to_string()),
    }
}

pub async fn reviews_inner(
    ctx: Arc<DashboardContext>,
    req: FilterRequest,
) -> (StatusCode, serde_json::Value) {
    match parse_filter(req) {
        Ok((field, value)) => run(ctx, DashboardRequest::FilterReviews { field, value }).await,
        Err(e) => e,
    }
}

pub async fn trends_inner(
    ctx: Arc<DashboardContext>,
    req: FilterRequest,
) -> (StatusCode, serde_json::Value) {
    match parse_filter(req) {
        Ok((field, value)) => run(ctx, DashboardRequest::Trends { field, value }).await,
        Err(e) => e,
    }
}

pub async fn issues_inner(ctx: Arc<DashboardContext>) -> (StatusCode, serde_json::Value) {
    run(ctx, DashboardRequest::Issues).await
}

pub async fn issue_sample_inner(
    ctx: Arc<DashboardContext>,
    req: IssueRequest,
) -> (StatusCode, serde_json::Value) {
    match required(req.aspect, "aspect") {
        Ok(aspect) => run(ctx, DashboardRequest::SampleReview { aspect, seed: req.seed }).await,
        Err(e) => e,
    }
}

pub async fn similar_inner(
    ctx: Arc<DashboardContext>,
    req: SimilarRequest,
) -> (StatusCode, serde_json::Value) {
    match required(req.review, "review") {
        Ok(review) => run(ctx, DashboardRequest::Recommend { review }).await,
        Err(e) => e,
    }
}

pub async fn similar_issue_inner(
    ctx: Arc<DashboardContext>,
    req: IssueRequest,
) -> (StatusCode, serde_json::Value) {
    match required(req.aspect, "aspect") {
        Ok(aspect) => {
            run(ctx, DashboardRequest::RecommendForIssue { aspect, seed: req.seed }).await
        }
        Err(e) => e,
    }
}

pub async fn topics_inner(ctx: Arc<DashboardContext>) -> (StatusCode, serde_json::Value) {
    run(ctx, DashboardRequest::Topics).await
}

pub async fn topic_issues_inner(
    ctx: Arc<DashboardContext>,
    req: TopicIssuesRequest,
) -> (StatusCode, serde_json::Value) {
    match required(req.topic, "topic") {
        Ok(topic) => {
            run(
                ctx,
                DashboardRequest::TopicIssues {
                    topic,
                    samples_per_issue: req.samples_per_issue,
                    seed: req.seed,
                },
            )
            .await
        }
        Err(e) => e,
    }
}

fn parse_filter(
    req: FilterRequest,
) -> std::result::Result<(FilterField, String), (StatusCode, serde_json::Value)> {
    let field = required(req.field, "field")?;
    let value = required(req.value, "value")?;
    let field = field
        .parse::<FilterField>()
        .map_err(|e| bad_request(e.to_string()))?;
    Ok((field, value))
}

/// Dispatch through the router and map the envelope onto an HTTP status.
async fn run(ctx: Arc<DashboardContext>, request: DashboardRequest) -> (StatusCode, serde_json::Value) {
    let response = router::dispatch(request, ctx).await;
    match response_to_http(response) {
        Ok(data) => (StatusCode::OK, data),
        Err(e) => bad_request(e),
    }
}

// ============================================================================
// Axum handler wrappers (thin: delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.context);
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn summary_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<SummaryQuery>,
) -> impl IntoResponse {
    let (status, body) = summary_inner(state.context.clone(), query).await;
    (status, Json(body))
}

pub async fn ratings_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<RatingsRequest>,
) -> impl IntoResponse {
    let (status, body) = ratings_inner(state.context.clone(), req).await;
    (status, Json(body))
}

pub async fn filters_handler(
    State(state): State<Arc<HttpState>>,
    Path(field): Path<String>,
) -> impl IntoResponse {
    let (status, body) = filters_inner(state.context.clone(), &field).await;
    (status, Json(body))
}

pub async fn reviews_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<FilterRequest>,
) -> impl IntoResponse {
    let (status, body) = reviews_inner(state.context.clone(), req).await;
    (status, Json(body))
}

pub async fn trends_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<FilterRequest>,
) -> impl IntoResponse {
    let (status, body) = trends_inner(state.context.clone(), req).await;
    (status, Json(body))
}

pub async fn issues_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = issues_inner(state.context.clone()).await;
    (status, Json(body))
}

pub async fn issue_sample_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<IssueRequest>,
) -> impl IntoResponse {
    let (status, body) = issue_sample_inner(state.context.clone(), req).await;
    (status, Json(body))
}

pub async fn similar_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<SimilarRequest>,
) -> impl IntoResponse {
    let (status, body) = similar_inner(state.context.clone(), req).await;
    (status, Json(body))
}

pub async fn similar_issue_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<IssueRequest>,
) -> impl IntoResponse {
    let (status, body) = similar_issue_inner(state.context.clone(), req).await;
    (status, Json(body))
}

pub async fn topics_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = topics_inner(state.context.clone()).await;
    (status, Json(body))
}

pub async fn topic_issues_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<TopicIssuesRequest>,
) -> impl IntoResponse {
    let (status, body) = topic_issues_inner(state.context.clone(), req).await;
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

/// Convert an IPC `DashboardResponse` into an HTTP body value, or an error string.
pub fn response_to_http(response: DashboardResponse) -> std::result::Result<serde_json::Value, String> {
    if response.is_ok() {
        Ok(response.data.unwrap_or(serde_json::json!({})))
    } else {
        Err(response.error.unwrap_or_else(|| "unknown error".to_string()))
    }
}

// ============================================================================
// Unit Tests: call inner functions directly
// ============================================================================

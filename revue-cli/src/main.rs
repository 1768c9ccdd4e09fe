//! revue-cli: terminal dashboard for the Revue review analysis server
//!
//! Talks to the Revue HTTP API and renders the dashboard views as text.
//!
//! # Subcommands
//! - `summary`                         : key metrics and sample reviews
//! - `ratings --field <f>`             : mean rating by category (bar chart)
//! - `filter --field <f> --value <v>`  : reviews matching a topic or company
//! - `trends --field <f> --value <v>`  : yearly and recent-monthly rating trends
//! - `issues`                          : issue categories of non-positive reviews
//! - `similar --issue <aspect>`        : sample an issue review and show similar ones
//! - `topics`                          : topic overview
//! - `topic <name>`                    : per-issue breakdown of one topic
//! - `status`                          : show server health
//!
//! `--json` prints the server's JSON instead of the rendered view.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use revue_core::{
    DatasetSummary, IssueBreakdown, RatingGroup, Review, SimilarReview, TopicOverview,
    TrendPoint,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8770";
const BAR_WIDTH: usize = 30;
const RATING_SCALE: f64 = 5.0;
const PREVIEW_CHARS: usize = 70;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "revue-cli", version, about = "App review dashboard in the terminal")]
struct Cli {
    /// Revue HTTP server URL (overrides REVUE_HTTP_URL env var)
    #[arg(long, env = "REVUE_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    /// Print raw JSON instead of the rendered view
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Key metrics and the first rows of the dataset
    Summary {
        #[arg(short = 'n', long)]
        rows: Option<usize>,
    },

    /// Mean rating per value of a category field, lowest first
    Ratings {
        /// sentiment, topic, company, year or data_source
        #[arg(short, long)]
        field: String,
    },

    /// Reviews whose topic or company equals a value
    Filter {
        /// topic or company
        #[arg(short, long)]
        field: String,
        #[arg(short, long)]
        value: String,
    },

    /// Yearly and recent-monthly rating trends for a topic or company
    Trends {
        /// topic or company
        #[arg(short, long)]
        field: String,
        #[arg(short, long)]
        value: String,
    },

    /// List issue categories
    Issues,

    /// Pick a review for an issue and recommend similar reviews
    Similar {
        #[arg(short, long)]
        issue: String,
        /// Seed for a reproducible sample
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Overview of issue topics
    Topics,

    /// Issue breakdown of one topic
    Topic {
        name: String,
        /// Sample reviews per issue
        #[arg(short, long)]
        samples: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show Revue server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RatingsResponse {
    pub field: String,
    pub groups: Vec<RatingGroup>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewsResponse {
    pub value: String,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Deserialize)]
pub struct TrendsResponse {
    pub value: String,
    pub yearly: Vec<TrendPoint<i32>>,
    pub monthly: Vec<TrendPoint<String>>,
}

#[derive(Debug, Deserialize)]
pub struct IssuesResponse {
    pub issues: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueRecommendationResponse {
    pub aspect: String,
    pub sample_review: Option<String>,
    pub similar: Vec<SimilarReview>,
}

#[derive(Debug, Deserialize)]
pub struct TopicsResponse {
    pub topics: Vec<TopicOverview>,
}

#[derive(Debug, Deserialize)]
pub struct TopicIssuesResponse {
    pub topic: String,
    pub issues: Vec<IssueBreakdown>,
}

// ============================================================================
// HTTP Client
// ============================================================================

struct ApiClient {
    server: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    fn new(server: &str) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn get(&self, path: &str) -> anyhow::Result<serde_json::Value> {
        let url = format!("{}{}", self.server, path);
        let resp = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("connection failed to {}", url))?;
        Self::read(resp)
    }

    fn post(&self, path: &str, body: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let url = format!("{}{}", self.server, path);
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .with_context(|| format!("connection failed to {}", url))?;
        Self::read(resp)
    }

    fn read(resp: reqwest::blocking::Response) -> anyhow::Result<serde_json::Value> {
        let status = resp.status();
        let body: serde_json::Value = resp.json().context("failed to parse server response")?;
        if !status.is_success() {
            let msg = body["error"].as_str().unwrap_or("unknown error");
            bail!("server returned {}: {}", status, msg);
        }
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> anyhow::Result<T> {
    serde_json::from_value(value).context("unexpected response shape")
}

// ============================================================================
// Rendering
// ============================================================================

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

fn bar(value: f64) -> String {
    let filled = ((value / RATING_SCALE) * BAR_WIDTH as f64)
        .round()
        .clamp(0.0, BAR_WIDTH as f64) as usize;
    "█".repeat(filled)
}

pub fn render_summary(summary: &DatasetSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total reviews:  {}\n", summary.total_reviews));
    out.push_str(&format!("Apps:           {}\n", summary.app_count));
    match summary.average_rating {
        Some(avg) => out.push_str(&format!("Average rating: {:.1}\n", avg)),
        None => out.push_str("Average rating: -\n"),
    }
    out.push_str(&format!(
        "Years:          {}\n",
        summary.year_range_label.as_deref().unwrap_or("-")
    ));
    out.push('\n');
    out.push_str("Sample reviews\n");
    out.push_str(&render_reviews(&summary.sample));
    out
}

pub fn render_reviews(reviews: &[Review]) -> String {
    if reviews.is_empty() {
        return "No reviews found.\n".to_string();
    }
    let mut out = format!(
        "{:<6} {:<12} {:<10} {:<14} {}\n",
        "RATING", "COMPANY", "SENTIMENT", "TOPIC", "REVIEW"
    );
    for r in reviews {
        out.push_str(&format!(
            "{:<6.1} {:<12} {:<10} {:<14} {}\n",
            r.rating,
            truncate(&r.company, 12),
            truncate(r.sentiment.as_deref().unwrap_or("-"), 10),
            truncate(r.topic.as_deref().unwrap_or("-"), 14),
            truncate(r.review.as_deref().unwrap_or(""), PREVIEW_CHARS),
        ));
    }
    out
}

pub fn render_ratings(field: &str, groups: &[RatingGroup]) -> String {
    if groups.is_empty() {
        return format!("No ratings found for {}.\n", field);
    }
    let labels: Vec<String> = groups.iter().map(|g| g.key.to_string()).collect();
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut out = format!("Average rating by {}\n", field);
    for (label, group) in labels.iter().zip(groups) {
        out.push_str(&format!(
            "{:<width$} {} {:.2} ({} reviews, {:.1}%)\n",
            label,
            bar(group.average_rating),
            group.average_rating,
            group.review_count,
            group.percentage,
            width = width
        ));
    }
    out
}

/// One row per period with a marker placed on a 0–5 rating axis.
fn trend_rows<K: std::fmt::Display>(points: &[TrendPoint<K>]) -> String {
    let mut out = String::new();
    for p in points {
        let pos = ((p.average_rating / RATING_SCALE) * (BAR_WIDTH - 1) as f64)
            .round()
            .clamp(0.0, (BAR_WIDTH - 1) as f64) as usize;
        let mut axis: Vec<char> = vec!['·'; BAR_WIDTH];
        axis[pos] = '●';
        let axis: String = axis.into_iter().collect();
        out.push_str(&format!("{:<8} |{}| {:.2}\n", p.period, axis, p.average_rating));
    }
    out
}

pub fn render_trends(value: &str, yearly: &[TrendPoint<i32>], monthly: &[TrendPoint<String>]) -> String {
    if yearly.is_empty() && monthly.is_empty() {
        return format!("No reviews found for {}.\n", value);
    }
    let mut out = format!("Yearly rating trend: {}\n", value);
    out.push_str(&trend_rows(yearly));
    out.push_str(&format!("\nRecent monthly rating trend: {}\n", value));
    out.push_str(&trend_rows(monthly));
    out
}

fn card(title: &str, lines: &[String]) -> String {
    let width = std::iter::once(title.chars().count())
        .chain(lines.iter().map(|l| l.chars().count()))
        .max()
        .unwrap_or(0);
    let mut out = format!("┌{}┐\n", "─".repeat(width + 2));
    out.push_str(&format!("│ {:<width$} │\n", title, width = width));
    out.push_str(&format!("├{}┤\n", "─".repeat(width + 2)));
    for line in lines {
        out.push_str(&format!("│ {:<width$} │\n", line, width = width));
    }
    out.push_str(&format!("└{}┘\n", "─".repeat(width + 2)));
    out
}

pub fn render_recommendations(resp: &IssueRecommendationResponse) -> String {
    let Some(sample) = &resp.sample_review else {
        return format!("No recommendations for issue '{}'.\n", resp.aspect);
    };
    let mut out = format!("Issue: {}\nSelected review: {}\n\n", resp.aspect, sample);
    if resp.similar.is_empty() {
        out.push_str("No similar reviews found.\n");
        return out;
    }
    for s in &resp.similar {
        out.push_str(&card(
            &s.aspect,
            &[
                truncate(&s.review, PREVIEW_CHARS),
                format!("rating {:.1}  similarity {:.3}", s.rating, s.similarity),
            ],
        ));
    }
    out
}

pub fn render_topics(topics: &[TopicOverview]) -> String {
    if topics.is_empty() {
        return "No topics found.\n".to_string();
    }
    topics
        .iter()
        .map(|t| {
            card(
                &t.topic,
                &[
                    format!("reviews {}  ({:.2}%)", t.review_count, t.percentage),
                    format!("average rating {:.2}", t.average_rating),
                ],
            )
        })
        .collect()
}

pub fn render_topic_issues(topic: &str, issues: &[IssueBreakdown]) -> String {
    if issues.is_empty() {
        return format!("No issues found for topic '{}'.\n", topic);
    }
    let mut out = String::new();
    for issue in issues {
        let mut lines = vec![format!(
            "reviews {}  ({:.2}%)  average rating {:.2}",
            issue.review_count, issue.percentage, issue.average_rating
        )];
        for s in &issue.samples {
            lines.push(format!(
                "[{:.1}] {} ({})",
                s.rating,
                truncate(s.review.as_deref().unwrap_or("-"), PREVIEW_CHARS),
                s.aspect_index.as_deref().unwrap_or("-")
            ));
        }
        out.push_str(&card(&format!("#{} {}", issue.number, issue.aspect), &lines));
    }
    out
}

// ============================================================================
// Commands
// ============================================================================

fn fetch(client: &ApiClient, command: &Commands) -> anyhow::Result<serde_json::Value> {
    match command {
        Commands::Summary { rows } => match rows {
            Some(n) => client.get(&format!("/summary?sample_rows={}", n)),
            None => client.get("/summary"),
        },
        Commands::Ratings { field } => {
            client.post("/ratings", serde_json::json!({ "field": field }))
        }
        Commands::Filter { field, value } => client.post(
            "/reviews",
            serde_json::json!({ "field": field, "value": value }),
        ),
        Commands::Trends { field, value } => client.post(
            "/trends",
            serde_json::json!({ "field": field, "value": value }),
        ),
        Commands::Issues => client.get("/issues"),
        Commands::Similar { issue, seed } => client.post(
            "/similar/issue",
            serde_json::json!({ "aspect": issue, "seed": seed }),
        ),
        Commands::Topics => client.get("/topics"),
        Commands::Topic {
            name,
            samples,
            seed,
        } => client.post(
            "/topics/issues",
            serde_json::json!({ "topic": name, "samples_per_issue": samples, "seed": seed }),
        ),
        Commands::Status => client.get("/health"),
    }
}

fn render(command: &Commands, data: serde_json::Value) -> anyhow::Result<String> {
    let output = match command {
        Commands::Summary { .. } => render_summary(&decode::<DatasetSummary>(data)?),
        Commands::Ratings { .. } => {
            let r: RatingsResponse = decode(data)?;
            render_ratings(&r.field, &r.groups)
        }
        Commands::Filter { .. } => {
            let r: ReviewsResponse = decode(data)?;
            if r.reviews.is_empty() {
                format!("No reviews found for {}.\n", r.value)
            } else {
                render_reviews(&r.reviews)
            }
        }
        Commands::Trends { .. } => {
            let r: TrendsResponse = decode(data)?;
            render_trends(&r.value, &r.yearly, &r.monthly)
        }
        Commands::Issues => {
            let r: IssuesResponse = decode(data)?;
            if r.issues.is_empty() {
                "No issues found.\n".to_string()
            } else {
                r.issues.iter().map(|i| format!("- {}\n", i)).collect()
            }
        }
        Commands::Similar { .. } => render_recommendations(&decode(data)?),
        Commands::Topics => render_topics(&decode::<TopicsResponse>(data)?.topics),
        Commands::Topic { .. } => {
            let r: TopicIssuesResponse = decode(data)?;
            render_topic_issues(&r.topic, &r.issues)
        }
        Commands::Status => format!(
            "Revue server: {}\nVersion:      {}\nReviews:      {}\nSocket:       {}\n",
            data["status"].as_str().unwrap_or("unknown"),
            data["version"].as_str().unwrap_or("?"),
            data["reviews"],
            data["socket"].as_str().unwrap_or("?"),
        ),
    };
    Ok(output)
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let client = ApiClient::new(&cli.server)?;
    let data = fetch(&client, &cli.command)?;

    if cli.json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(&data)?));
    }
    render(&cli.command, data)
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("revue-cli: {:#}", e);
            std::process::exit(1);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use revue_core::{GroupKey, IssueSample};

    fn rating_group(key: GroupKey, avg: f64) -> RatingGroup {
        RatingGroup {
            key,
            average_rating: avg,
            review_count: 2,
            percentage: 33.333,
        }
    }

    // ========================================================================
    // TEST 1: bar length scales with rating and is clamped
    // ========================================================================
    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(5.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(2.5).chars().count(), BAR_WIDTH / 2);
        assert_eq!(bar(0.0), "");
        assert_eq!(bar(11.0).chars().count(), BAR_WIDTH, "out-of-range ratings clamp");
    }

    // ========================================================================
    // TEST 2: ratings chart keeps server order and rounds percentages
    // ========================================================================
    #[test]
    fn test_render_ratings() {
        let groups = vec![
            rating_group(GroupKey::Year(2021), 2.5),
            rating_group(GroupKey::Year(2020), 4.5),
        ];
        let out = render_ratings("year", &groups);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Average rating by year");
        assert!(lines[1].starts_with("2021"));
        assert!(lines[1].contains("2.50 (2 reviews, 33.3%)"));
        assert!(lines[2].starts_with("2020"));

        assert_eq!(render_ratings("topic", &[]), "No ratings found for topic.\n");
    }

    #[test]
    fn test_render_trends_empty_and_marker() {
        assert_eq!(render_trends("Tidal", &[], &[]), "No reviews found for Tidal.\n");

        let yearly = vec![TrendPoint {
            period: 2021,
            average_rating: 5.0,
            review_count: 1,
        }];
        let out = render_trends("Spotify", &yearly, &[]);
        let row = out.lines().nth(1).unwrap();
        assert!(row.starts_with("2021"));
        assert!(row.contains("●| 5.00"), "top rating sits at the right edge: {}", row);
    }

    // ========================================================================
    // TEST 3: recommendation cards and the "no recommendations" message
    // ========================================================================
    #[test]
    fn test_render_recommendations() {
        let none = IssueRecommendationResponse {
            aspect: "billing".into(),
            sample_review: None,
            similar: vec![],
        };
        assert_eq!(
            render_recommendations(&none),
            "No recommendations for issue 'billing'.\n"
        );

        let some = IssueRecommendationResponse {
            aspect: "crash".into(),
            sample_review: Some("app crashes on launch".into()),
            similar: vec![SimilarReview {
                aspect: "crash".into(),
                review: "app crashes often".into(),
                rating: 2.0,
                similarity: 0.6876,
            }],
        };
        let out = render_recommendations(&some);
        assert!(out.contains("Selected review: app crashes on launch"));
        assert!(out.contains("│ app crashes often"));
        assert!(out.contains("similarity 0.688"));
    }

    #[test]
    fn test_card_lines_share_width() {
        let out = card("ads", &["short".into(), "a much longer line".into()]);
        let widths: Vec<usize> = out.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{}", out);
    }

    #[test]
    fn test_render_topic_issues() {
        let issues = vec![IssueBreakdown {
            number: 1,
            aspect: "frequency".into(),
            review_count: 2,
            percentage: 66.6666,
            average_rating: 1.5,
            samples: vec![IssueSample {
                review: Some("too many ads".into()),
                rating: 2.0,
                aspect_index: Some("a1".into()),
            }],
        }];
        let out = render_topic_issues("ads", &issues);
        assert!(out.contains("#1 frequency"));
        assert!(out.contains("(66.67%)"));
        assert!(out.contains("[2.0] too many ads (a1)"));
        assert_eq!(
            render_topic_issues("billing", &[]),
            "No issues found for topic 'billing'.\n"
        );
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn test_render_summary_rounds_average_to_one_decimal() {
        let summary = DatasetSummary {
            total_reviews: 3,
            app_count: 2,
            average_rating: Some(10.0 / 3.0),
            year_range: None,
            year_range_label: Some("2020 ~ 2021".to_string()),
            sample: Vec::new(),
        };
        let out = render_summary(&summary);
        assert!(out.contains("Average rating: 3.3\n"));
        assert!(out.contains("Years:          2020 ~ 2021\n"));
        assert!(out.ends_with("No reviews found.\n"));
    }

    #[test]
    fn test_cli_parses_global_json_flag() {
        let cli = Cli::try_parse_from(["revue-cli", "ratings", "--field", "year", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Ratings { ref field } if field == "year"));
    }
}

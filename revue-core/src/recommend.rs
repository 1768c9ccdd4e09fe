//! Similar-review recommender
//!
//! Builds a TF-IDF space over every review body in the table, ranks the corpus
//! by cosine similarity to a target review and returns the runners-up.
//!
//! Ranking convention: the target's similarity row is sorted ascending and the
//! `SIMILAR_REVIEW_COUNT` entries just before the last one are taken. The last
//! entry is normally the target itself (similarity 1), so it is excluded without
//! an explicit self check. Candidates without an aspect are dropped afterwards,
//! which can leave fewer than `SIMILAR_REVIEW_COUNT` results. Output stays in
//! ascending similarity order.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::ReviewTable;
use crate::models::Review;
use crate::tfidf::{cosine_similarity_matrix, TfidfVectorizer};

/// Size of the ranking slice taken below the top entry.
pub const SIMILAR_REVIEW_COUNT: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    #[error("target review is empty")]
    EmptyTarget,

    #[error("target review is not in the corpus")]
    TargetNotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarReview {
    pub aspect: String,
    pub review: String,
    pub rating: f64,
    pub similarity: f64,
}

/// A sampled review for an issue together with its recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecommendations {
    pub aspect: String,
    pub sample_review: String,
    pub similar: Vec<SimilarReview>,
}

/// Reviews similar to `target`, which must match a review body exactly.
pub fn recommend_similar(
    table: &ReviewTable,
    target: &str,
) -> Result<Vec<SimilarReview>, RecommendError> {
    if target.trim().is_empty() {
        return Err(RecommendError::EmptyTarget);
    }

    // (record index, body) for every review that has a body
    let corpus: Vec<(usize, &str)> = table
        .records()
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.review.as_deref().map(|text| (i, text)))
        .collect();

    let position = corpus
        .iter()
        .position(|(_, text)| *text == target)
        .ok_or(RecommendError::TargetNotFound)?;

    let texts: Vec<&str> = corpus.iter().map(|(_, text)| *text).collect();
    let matrix = TfidfVectorizer::new().fit_transform(&texts);
    let similarity = cosine_similarity_matrix(&matrix);
    let row = similarity.row(position);

    let mut order: Vec<usize> = (0..row.len()).collect();
    order.sort_by(|&a, &b| row[a].total_cmp(&row[b]));

    let end = order.len() - 1;
    let start = end.saturating_sub(SIMILAR_REVIEW_COUNT);

    let results: Vec<SimilarReview> = order[start..end]
        .iter()
        .filter_map(|&pos| {
            let record = &table.records()[corpus[pos].0];
            let aspect = record.aspect.clone()?;
            Some(SimilarReview {
                aspect,
                review: corpus[pos].1.to_string(),
                rating: record.rating,
                similarity: row[pos],
            })
        })
        .collect();

    tracing::debug!(
        corpus = corpus.len(),
        returned = results.len(),
        "Ranked similar reviews"
    );
    Ok(results)
}

/// Aspects of non-positive reviews, in order of first appearance.
pub fn issue_options(table: &ReviewTable) -> Vec<String> {
    let mut options: Vec<String> = Vec::new();
    for review in table.records().iter().filter(|r| !r.is_positive()) {
        if let Some(aspect) = &review.aspect {
            if !options.contains(aspect) {
                options.push(aspect.clone());
            }
        }
    }
    options
}

/// A uniformly random review body among the reviews tagged with `aspect`.
pub fn sample_review_for_issue<'a, R: Rng + ?Sized>(
    table: &'a ReviewTable,
    aspect: &str,
    rng: &mut R,
) -> Option<&'a Review> {
    let candidates: Vec<&Review> = table
        .records()
        .iter()
        .filter(|r| r.aspect.as_deref() == Some(aspect) && r.review.is_some())
        .collect();
    candidates.choose(rng).copied()
}

/// Sample a review for `aspect` and recommend reviews similar to it.
///
/// `Ok(None)` means the issue has no review bodies to start from.
pub fn recommend_for_issue<R: Rng + ?Sized>(
    table: &ReviewTable,
    aspect: &str,
    rng: &mut R,
) -> Result<Option<IssueRecommendations>, RecommendError> {
    let Some(sample) = sample_review_for_issue(table, aspect, rng) else {
        return Ok(None);
    };
    let Some(text) = sample.review.as_deref() else {
        return Ok(None);
    };

    let similar = recommend_similar(table, text)?;
    Ok(Some(IssueRecommendations {
        aspect: aspect.to_string(),
        sample_review: text.to_string(),
        similar,
    }))
}

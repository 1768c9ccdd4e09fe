//! TF-IDF vectorization and cosine similarity over review texts
//!
//! Weighting:
//! - Tokens: lowercase, `\b\w\w+\b` (single characters dropped), English stop words removed
//! - TF: raw term count per document
//! - IDF: smoothed, `ln((1 + n) / (1 + df)) + 1`
//! - Rows are L2-normalized; a document with no surviving tokens stays all-zero
//!
//! Vocabulary columns are ordered alphabetically.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use ndarray::{Array1, Array2, Axis};
use regex::Regex;

use crate::stop_words::is_stop_word;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"));

/// Vectorizer fitted on one corpus at a time.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    /// Term -> column index
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowercased, stop-word-free tokens of `text`, in order of appearance.
    pub fn tokenize(text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        TOKEN_PATTERN
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !is_stop_word(t))
            .map(str::to_string)
            .collect()
    }

    /// Fit the vocabulary and IDF weights on `documents` and return their
    /// `(documents, terms)` TF-IDF matrix.
    pub fn fit_transform(&mut self, documents: &[&str]) -> Array2<f64> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| Self::tokenize(d)).collect();

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let mut seen: Vec<&String> = tokens.iter().collect();
            seen.sort();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        self.idf = document_frequency
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        self.vocabulary = document_frequency
            .into_keys()
            .enumerate()
            .map(|(i, term)| (term, i))
            .collect();

        let mut matrix = Array2::<f64>::zeros((documents.len(), self.vocabulary.len()));
        for (row, tokens) in tokenized.iter().enumerate() {
            for token in tokens {
                if let Some(&col) = self.vocabulary.get(token) {
                    matrix[[row, col]] += 1.0;
                }
            }
        }
        for (col, idf) in self.idf.iter().enumerate() {
            matrix.column_mut(col).mapv_inplace(|tf| tf * idf);
        }
        l2_normalize_rows(&mut matrix);

        tracing::debug!(
            documents = documents.len(),
            vocabulary = self.vocabulary.len(),
            "Fitted TF-IDF vectorizer"
        );
        matrix
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

fn l2_normalize_rows(matrix: &mut Array2<f64>) {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|x| x / norm);
        }
    }
}

/// Pairwise cosine similarity between the rows of `vectors`.
///
/// Rows with zero norm have similarity 0 with everything, themselves included.
pub fn cosine_similarity_matrix(vectors: &Array2<f64>) -> Array2<f64> {
    let norms: Array1<f64> = vectors
        .axis_iter(Axis(0))
        .map(|row| row.dot(&row).sqrt())
        .collect();

    let mut normalized = vectors.clone();
    for (mut row, &norm) in normalized.axis_iter_mut(Axis(0)).zip(norms.iter()) {
        if norm > 0.0 {
            row.mapv_inplace(|x| x / norm);
        }
    }

    normalized.dot(&normalized.t())
}

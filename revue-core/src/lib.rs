pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ipc;
pub mod models;
pub mod recommend;
pub mod stop_words;
pub mod tfidf;
pub mod topics;
pub mod trends;

pub use aggregate::{average_rating_by, RatingGroup};
pub use config::{load_dashboard, RevueConfig};
pub use dataset::{DatasetError, DatasetSummary, ReviewTable};
pub use error::RevueError;
pub use models::{CategoryField, FilterField, GroupKey, Review};
pub use recommend::{IssueRecommendations, RecommendError, SimilarReview, SIMILAR_REVIEW_COUNT};
pub use tfidf::{cosine_similarity_matrix, TfidfVectorizer};
pub use topics::{IssueBreakdown, IssueSample, TopicOverview};
pub use trends::{RatingTrends, TrendPoint};

//! Content analysis
//!
//! This module contains the scoring side of the pipeline:
//! - Text similarity, shingle fingerprints and duplicate detection
//! - Flesch readability
//! - Multi-dimension quality scoring
//! - Ranking pages of a batch against each other

pub mod comparison;
pub mod quality;
pub mod readability;
pub mod similarity;

pub use comparison::{
    comparison_recommendations, metric_leaders, page_weight_score, ComparisonMetric, MetricLeader,
};
pub use quality::{score_page, Dimension, Grade, QualityInput, QualityScore, ScoreBreakdown};
pub use readability::{analyze_readability, flesch_reading_ease, Readability, ReadingLevel};
pub use similarity::{
    cosine_similarity, detect_duplicates, fingerprint, has_changed, jaccard_similarity,
    DuplicateKind, DuplicatePair, SimilarityLog, SimilarityRecord,
};

// Score bucketing
// Thresholds are fixed presentation constants, not user settings.

use crate::models::{SentimentLabel, SubjectivityLabel};

/// Polarity strictly above this is Positive.
pub const POSITIVE_THRESHOLD: f64 = 0.1;
/// Polarity strictly below this is Negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.1;
/// Subjectivity strictly above this is Opinionated.
pub const OPINIONATED_THRESHOLD: f64 = 0.5;

pub fn classify_polarity(polarity: f64) -> SentimentLabel {
    if polarity > POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if polarity < NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

pub fn classify_subjectivity(subjectivity: f64) -> SubjectivityLabel {
    if subjectivity > OPINIONATED_THRESHOLD {
        SubjectivityLabel::Opinionated
    } else {
        SubjectivityLabel::Factual
    }
}

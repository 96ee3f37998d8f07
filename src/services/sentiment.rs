// Sentiment Scoring
// Lexicon-driven polarity/subjectivity scorer behind the `SentimentScorer` trait

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::SentimentScores;
use crate::services::text_processor::{normalize_punctuation, sentiment_words, split_sentences};

/// Negated words keep half their strength with the sign flipped.
const NEGATION_FACTOR: f64 = -0.5;

pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentScores;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub polarity: f64,
    pub subjectivity: f64,
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

impl LexiconEntry {
    /// Modifiers like "very" carry no polarity of their own.
    fn is_intensifier(&self) -> bool {
        self.polarity == 0.0 && (self.intensity - 1.0).abs() > f64::EPSILON
    }
}

fn default_intensity() -> f64 { 1.0 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub negations: Vec<String>,
    /// Words that neither score nor break a negation/intensifier chain.
    #[serde(default)]
    pub passthrough: Vec<String>,
    pub words: HashMap<String, LexiconEntry>,
}

pub struct LexiconSentimentScorer {
    words: HashMap<String, LexiconEntry>,
    negations: HashSet<String>,
    passthrough: HashSet<String>,
    version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub word: String,
    pub polarity: f64,
    pub subjectivity: f64,
}

impl LexiconSentimentScorer {
    pub fn new(lexicon: Lexicon) -> Self {
        let words = lexicon
            .words
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        Self {
            words,
            negations: lexicon.negations.into_iter().map(|w| w.to_lowercase()).collect(),
            passthrough: lexicon.passthrough.into_iter().map(|w| w.to_lowercase()).collect(),
            version: lexicon.version,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Per-word assessments; negation and intensifiers never cross a sentence boundary.
    pub fn assessments(&self, text: &str) -> Vec<Assessment> {
        let normalized = normalize_punctuation(text);
        let mut out = Vec::new();

        for sentence in split_sentences(&normalized) {
            let mut negate = false;
            let mut pending: Option<f64> = None;

            for word in sentiment_words(&sentence.text) {
                if self.negations.contains(&word) {
                    negate = true;
                    continue;
                }
                if self.passthrough.contains(&word) {
                    continue;
                }

                let entry = match self.words.get(&word) {
                    Some(e) => e,
                    None => {
                        negate = false;
                        pending = None;
                        continue;
                    }
                };

                if entry.is_intensifier() {
                    pending = Some(pending.unwrap_or(1.0) * entry.intensity);
                    continue;
                }

                let multiplier = pending.take().unwrap_or(1.0);
                let mut polarity = (entry.polarity * multiplier).clamp(-1.0, 1.0);
                let subjectivity = (entry.subjectivity * multiplier).clamp(0.0, 1.0);
                if negate {
                    polarity *= NEGATION_FACTOR;
                    negate = false;
                }

                out.push(Assessment {
                    word,
                    polarity,
                    subjectivity,
                });
            }
        }

        out
    }
}

impl SentimentScorer for LexiconSentimentScorer {
    fn score(&self, text: &str) -> SentimentScores {
        let assessments = self.assessments(text);
        if assessments.is_empty() {
            return SentimentScores::default();
        }

        let n = assessments.len() as f64;
        let polarity = assessments.iter().map(|a| a.polarity).sum::<f64>() / n;
        let subjectivity = assessments.iter().map(|a| a.subjectivity).sum::<f64>() / n;

        SentimentScores {
            polarity: polarity.clamp(-1.0, 1.0),
            subjectivity: subjectivity.clamp(0.0, 1.0),
        }
    }
}

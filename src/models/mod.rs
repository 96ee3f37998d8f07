// VoxPopuli Data Models
// Request/response shapes shared by the page, the JSON API and the CLI

use serde::{Deserialize, Serialize};

// ============ Requests ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: String,
}

/// Which button was pressed on the page form.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAction {
    Sample,
    Analyze,
}

impl std::str::FromStr for PageAction {
    type Err = String;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        match val.trim().to_lowercase().as_str() {
            "sample" => Ok(Self::Sample),
            "analyze" => Ok(Self::Analyze),
            other => Err(format!("unknown page action: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageForm {
    #[serde(default)]
    pub speech_input: String,
    #[serde(default)]
    pub action: String,
}

// ============ Labels ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "🔵",
            SentimentLabel::Negative => "🔴",
            SentimentLabel::Neutral => "⚪️",
        }
    }

    /// CSS color used for the score line in the result panel.
    pub fn color(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "#054187",
            SentimentLabel::Negative => "#E03A3E",
            SentimentLabel::Neutral => "#ffffff",
        }
    }

    pub fn display(self) -> String {
        format!("{} {}", self.marker(), self.as_str())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum SubjectivityLabel {
    Opinionated,
    Factual,
}

impl SubjectivityLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectivityLabel::Opinionated => "Opinionated",
            SubjectivityLabel::Factual => "Factual",
        }
    }
}

// ============ Analysis ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub text: String,
    pub label: String,
    /// UTF-8 byte offset (0-based) into the analyzed text.
    pub start: usize,
    /// UTF-8 byte offset (0-based, end-exclusive) into the analyzed text.
    pub end: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SentimentScores {
    pub polarity: f64,
    pub subjectivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAnalysis {
    pub polarity: f64,
    pub subjectivity: f64,
    pub sentiment: SentimentLabel,
    pub subjectivity_label: SubjectivityLabel,
    pub entities: Vec<NamedEntity>,
}

impl SpeechAnalysis {
    pub fn entity_texts(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnalysisOutcome {
    Analyzed(SpeechAnalysis),
    Warning { message: String },
}

// ============ Misc Responses ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleResponse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

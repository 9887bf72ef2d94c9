//! Sentiment labels and the single-text analysis payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed vocabulary of sentiment labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// All sentiment variants for iteration.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    /// Label used when a reply cannot be classified.
    pub const FALLBACK: Sentiment = Sentiment::Neutral;

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Match a label exactly, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        Self::ALL.into_iter().find(|s| s.as_str() == normalized)
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// POST /api/chat/sentiment-analysis request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Stored analysis as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResponse {
    pub analysis_id: String,
    pub user_id: String,
    pub text: String,
    pub sentiment: Sentiment,
    pub confidence: Option<f64>,
    pub model: String,
    pub timestamp: DateTime<Utc>,
    /// True when the label came from the default path rather than the model.
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

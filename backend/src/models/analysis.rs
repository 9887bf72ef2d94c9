use chrono::{DateTime, Utc};
use review_insight_common::{Sentiment, SentimentResponse};
use serde::Serialize;

/// A sentiment analysis about to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysis {
    pub user_id: String,
    pub text: String,
    pub sentiment: Sentiment,
    pub confidence: Option<f64>,
    pub model: String,
    /// Label came from the default path, not from the model.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field \"{0}\" is required")]
    MissingField(&'static str),
    #[error("Confidence {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),
}

impl NewAnalysis {
    /// Reject records that must never reach the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("userId"));
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError::MissingField("text"));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingField("model"));
        }
        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ValidationError::ConfidenceOutOfRange(confidence));
            }
        }
        Ok(())
    }
}

/// A persisted analysis. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub user_id: String,
    pub text: String,
    pub sentiment: Sentiment,
    pub confidence: Option<f64>,
    pub model: String,
    pub fallback: bool,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn into_response(self) -> SentimentResponse {
        let note = self
            .fallback
            .then(|| "Analysis used the fallback label".to_string());
        SentimentResponse {
            analysis_id: self.id,
            user_id: self.user_id,
            text: self.text,
            sentiment: self.sentiment,
            confidence: self.confidence,
            model: self.model,
            timestamp: self.created_at,
            fallback: self.fallback,
            note,
        }
    }
}

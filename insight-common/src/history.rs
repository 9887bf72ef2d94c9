//! Paginated analysis history payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Sentiment;

/// GET /api/chat/sentiment-analysis/{userId} response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub user_id: String,
    /// Total records for the user, independent of the page window.
    pub total: u64,
    pub analyses: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub analysis_id: String,
    /// Excerpt of the analysed text.
    pub text: String,
    pub sentiment: Sentiment,
    pub confidence: Option<f64>,
    pub model: String,
    pub timestamp: DateTime<Utc>,
    pub fallback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_response_shape() {
        let resp = HistoryResponse {
            user_id: "u1".to_string(),
            total: 5,
            analyses: vec![],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["total"], 5);
        assert!(json["analyses"].as_array().unwrap().is_empty());
    }
}

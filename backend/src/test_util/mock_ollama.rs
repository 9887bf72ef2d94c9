//! Canned Ollama `/api/generate` bodies for wiremock.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct MockGenerateResponse {
    pub model: String,
    pub response: String,
    pub done: bool,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

impl MockGenerateResponse {
    pub fn text(model: &str, response: &str) -> Self {
        Self {
            model: model.to_string(),
            response: response.to_string(),
            done: true,
            prompt_eval_count: Some(10),
            eval_count: Some(response.split_whitespace().count() as u32),
        }
    }

    pub fn json(response: &str) -> serde_json::Value {
        serde_json::to_value(Self::text("test-model", response)).unwrap_or_default()
    }

    pub fn error_json(message: &str) -> serde_json::Value {
        serde_json::json!({ "error": message })
    }
}

//! Ollama `/api/generate` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{InferenceClient, InferenceError, InferenceReply, InferenceRequest};

/// Client for communicating with the Ollama generate API.
pub struct OllamaClient {
    http_client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    images: &'a [String],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn send(&self, request: &InferenceRequest) -> InferenceReply {
        let body = OllamaGenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            images: &request.images,
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);

        tracing::debug!(
            "Sending generate request to Ollama: {} model={} images={}",
            url,
            request.model,
            request.images.len()
        );

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Transport {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Transport {
                status: Some(status.as_u16()),
                message: format!("{}: {}", status, body),
            });
        }

        let text = response.text().await.map_err(|e| InferenceError::Transport {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        let parsed: OllamaGenerateResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::debug!("Unreadable generate response body: {}", e);
            InferenceError::EmptyResponse
        })?;

        match parsed.response {
            Some(reply) if !reply.trim().is_empty() => Ok(reply),
            _ => Err(InferenceError::EmptyResponse),
        }
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    async fn generate(&self, request: &InferenceRequest) -> InferenceReply {
        // Dropping the send future on expiry aborts the in-flight request.
        match tokio::time::timeout(request.deadline, self.send(request)).await {
            Ok(reply) => reply,
            Err(_) => {
                tracing::warn!(
                    model = %request.model,
                    deadline_ms = %request.deadline.as_millis(),
                    "Ollama request abandoned at deadline"
                );
                Err(InferenceError::Timeout {
                    after: request.deadline,
                })
            }
        }
    }
}

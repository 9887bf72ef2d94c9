//! Inference client abstraction.
//!
//! An `InferenceClient` issues exactly one request to a generate-style
//! endpoint and gives up once the request's deadline passes. Retrying is left
//! to callers.

mod ollama;

pub use ollama::OllamaClient;

use std::time::Duration;

use async_trait::async_trait;

/// A single-shot generation request.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub model: String,
    pub prompt: String,
    /// Base64-encoded images attached to the prompt.
    pub images: Vec<String>,
    /// How long to wait before abandoning the call.
    pub deadline: Duration,
}

impl InferenceRequest {
    pub fn text(model: impl Into<String>, prompt: impl Into<String>, deadline: Duration) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            images: Vec::new(),
            deadline,
        }
    }

    pub fn with_image(mut self, base64_image: impl Into<String>) -> Self {
        self.images.push(base64_image.into());
        self
    }
}

/// Why an inference call produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    #[error("Inference timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// Network failure (`status` is `None`) or a non-2xx reply.
    #[error("Transport failure: {message}")]
    Transport { status: Option<u16>, message: String },

    /// The endpoint answered 2xx but without a `response` field.
    #[error("Inference endpoint returned an empty response")]
    EmptyResponse,
}

/// Raw reply text, or the reason there is none.
pub type InferenceReply = std::result::Result<String, InferenceError>;

/// Primary trait for inference backends.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send one request and wait at most `request.deadline` for the reply.
    async fn generate(&self, request: &InferenceRequest) -> InferenceReply;
}

//! Test doubles shared by unit and integration tests.

pub mod mock_ollama;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, DatabaseConfig, LoggingConfig, OllamaConfig};
use crate::llm::{InferenceClient, InferenceError, InferenceReply, InferenceRequest};
use crate::store::{AnalysisStore, StoreError};
use crate::AppState;

/// An [`InferenceClient`] answering from a script instead of a model.
///
/// The first rule whose needle appears in the prompt wins; otherwise the
/// default reply is used. Deadlines are honoured like the real client.
pub struct ScriptedClient {
    rules: Vec<(String, Duration, InferenceReply)>,
    default: InferenceReply,
    calls: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedClient {
    pub fn new(default: InferenceReply) -> Self {
        Self {
            rules: Vec::new(),
            default,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(Ok(text.to_string()))
    }

    pub fn on(self, needle: &str, reply: InferenceReply) -> Self {
        self.on_delayed(needle, Duration::ZERO, reply)
    }

    pub fn on_delayed(mut self, needle: &str, delay: Duration, reply: InferenceReply) -> Self {
        self.rules.push((needle.to_string(), delay, reply));
        self
    }

    /// Every request seen so far, in arrival order.
    pub fn calls(&self) -> Vec<InferenceRequest> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    async fn generate(&self, request: &InferenceRequest) -> InferenceReply {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let (delay, reply) = self
            .rules
            .iter()
            .find(|(needle, _, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, delay, reply)| (*delay, reply.clone()))
            .unwrap_or((Duration::ZERO, self.default.clone()));

        if delay.is_zero() {
            return reply;
        }
        match tokio::time::timeout(request.deadline, tokio::time::sleep(delay)).await {
            Ok(()) => reply,
            Err(_) => Err(InferenceError::Timeout {
                after: request.deadline,
            }),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        ollama: OllamaConfig {
            base_url: "http://localhost:11434".to_string(),
            text_model: "test-model".to_string(),
            vision_model: "test-vision".to_string(),
            text_timeout_secs: 5,
            vision_timeout_secs: 5,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        ..Config::default()
    }
}

/// State backed by an in-memory store and the given client.
pub fn test_state(
    config: Config,
    inference: Arc<dyn InferenceClient>,
) -> Result<Arc<AppState>, StoreError> {
    let store = AnalysisStore::new(&config.database.url)?;
    Ok(Arc::new(AppState::new(config, inference, Arc::new(store))))
}

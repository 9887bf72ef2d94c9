//! Configuration for the Review Insight backend.

use std::time::Duration;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure.
///
/// Built once at startup and handed to the components that need it; nothing
/// below this layer reads the process environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Inference endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Model used for text prompts.
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// Model used for image-bearing prompts.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_text_timeout")]
    pub text_timeout_secs: u64,
    #[serde(default = "default_vision_timeout")]
    pub vision_timeout_secs: u64,
}

impl OllamaConfig {
    pub fn text_deadline(&self) -> Duration {
        Duration::from_secs(self.text_timeout_secs)
    }

    pub fn vision_deadline(&self) -> Duration {
        Duration::from_secs(self.vision_timeout_secs)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            text_model: default_text_model(),
            vision_model: default_vision_model(),
            text_timeout_secs: default_text_timeout(),
            vision_timeout_secs: default_vision_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Batch orchestration limits.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Items processed when the caller does not give a cap.
    #[serde(default = "default_cap")]
    pub default_cap: usize,
    /// Maximum in-flight inference calls per batch (1 = sequential).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            default_cap: default_cap(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_limit")]
    pub default_limit: u32,
    /// Length of the text excerpt returned by history queries, in characters.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_history_limit(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_text_model() -> String {
    "llama3.2".to_string()
}
fn default_vision_model() -> String {
    "qwen2.5vl:7b".to_string()
}
fn default_text_timeout() -> u64 {
    30
}
fn default_vision_timeout() -> u64 {
    120
}
fn default_database_url() -> String {
    "sqlite:./data/insight.db".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cap() -> usize {
    10
}
fn default_concurrency() -> usize {
    1
}
fn default_history_limit() -> u32 {
    10
}
fn default_excerpt_chars() -> usize {
    100
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (INSIGHT__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("INSIGHT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

use std::{env, time::Duration};

use secrecy::SecretString;

use crate::services::generation_orchestrator::RetryPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub web_server_host: String,
    pub web_server_port: u16,
    pub allowed_origin: Option<String>,
    /// OpenAI-compatible endpoint of the local model. `None` means no model on this host.
    pub model_api_base: Option<String>,
    pub model_api_key: SecretString,
    pub model_name: String,
    pub model_default_temperature: f32,
    pub model_default_top_k: u32,
    pub model_max_top_k: u32,
    pub max_generation_attempts: u32,
    pub retry_backoff_ms: u64,
    pub max_source_chars: usize,
    /// JSON file backing the durable store. `None` keeps state in memory.
    pub store_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            allowed_origin: env::var("ALLOWED_ORIGIN").ok().filter(|o| !o.is_empty()),
            model_api_base: env::var("MODEL_API_BASE").ok().filter(|b| !b.is_empty()),
            model_api_key: SecretString::from(
                env::var("MODEL_API_KEY").unwrap_or_else(|_| "local".to_string()),
            ),
            model_name: env::var("MODEL_NAME").unwrap_or_else(|_| "gemma3:4b".to_string()),
            model_default_temperature: env::var("MODEL_DEFAULT_TEMPERATURE")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(1.0),
            model_default_top_k: env::var("MODEL_DEFAULT_TOP_K")
                .ok()
                .and_then(|k| k.parse().ok())
                .unwrap_or(3),
            model_max_top_k: env::var("MODEL_MAX_TOP_K")
                .ok()
                .and_then(|k| k.parse().ok())
                .unwrap_or(128),
            max_generation_attempts: env::var("MAX_GENERATION_ATTEMPTS")
                .ok()
                .and_then(|a| a.parse().ok())
                .filter(|a: &u32| *a > 0)
                .unwrap_or(3),
            retry_backoff_ms: env::var("RETRY_BACKOFF_MS")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(500),
            max_source_chars: env::var("MAX_SOURCE_CHARS")
                .ok()
                .and_then(|c| c.parse().ok())
                .unwrap_or(200_000),
            store_path: env::var("STORE_PATH").ok().filter(|p| !p.is_empty()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_generation_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            allowed_origin: None,
            model_api_base: None,
            model_api_key: SecretString::from("test_key".to_string()),
            model_name: "test-model".to_string(),
            model_default_temperature: 1.0,
            model_default_top_k: 3,
            model_max_top_k: 8,
            max_generation_attempts: 3,
            retry_backoff_ms: 0,
            max_source_chars: 200_000,
            store_path: None,
        }
    }
}

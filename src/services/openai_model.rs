use std::sync::atomic::{AtomicBool, Ordering};

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use crate::{
    config::Config,
    errors::GenerationError,
    services::model_service::{LanguageModel, ModelParams, ModelSession, SessionOptions},
};

/// Local model served behind an OpenAI-compatible chat endpoint (llama.cpp, Ollama, ...).
pub struct OpenAiLanguageModel {
    client: Client<OpenAIConfig>,
    model: String,
    params: ModelParams,
}

impl OpenAiLanguageModel {
    /// `None` when no endpoint is configured, i.e. the host has no model.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_base = config.model_api_base.as_ref()?;
        let openai_config = OpenAIConfig::new()
            .with_api_base(api_base.clone())
            .with_api_key(config.model_api_key.expose_secret().to_string());

        log::info!(
            "Using model '{}' at {}",
            config.model_name,
            api_base
        );

        Some(Self {
            client: Client::with_config(openai_config),
            model: config.model_name.clone(),
            params: ModelParams {
                default_temperature: config.model_default_temperature,
                default_top_k: config.model_default_top_k,
                max_top_k: config.model_max_top_k,
            },
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiLanguageModel {
    async fn params(&self) -> Result<ModelParams, GenerationError> {
        Ok(self.params)
    }

    async fn create(&self, options: SessionOptions) -> Result<Box<dyn ModelSession>, GenerationError> {
        Ok(Box::new(OpenAiSession {
            client: self.client.clone(),
            model: self.model.clone(),
            options,
            destroyed: AtomicBool::new(false),
        }))
    }
}

struct OpenAiSession {
    client: Client<OpenAIConfig>,
    model: String,
    options: SessionOptions,
    destroyed: AtomicBool,
}

impl OpenAiSession {
    fn request_body(&self, text: &str) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.options.system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": text }));

        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.options.temperature,
            "top_k": self.options.top_k,
            "stream": false
        })
    }
}

fn completion_text(response: &Value) -> Option<String> {
    response
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl ModelSession for OpenAiSession {
    async fn prompt(&self, text: &str) -> Result<String, GenerationError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(GenerationError::Model("session has been destroyed".to_string()));
        }

        let response: Value = self
            .client
            .chat()
            .create_byot(self.request_body(text))
            .await
            .map_err(|e| GenerationError::Model(e.to_string()))?;

        completion_text(&response)
            .ok_or_else(|| GenerationError::Model("completion contained no message content".to_string()))
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

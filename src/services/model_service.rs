use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{constants::quiz_prompt::JSON_SYSTEM_PROMPT, errors::GenerationError};

/// Interactive answers never sample from more than this many tokens.
const INTERACTIVE_TOP_K_LIMIT: u32 = 3;

/// Sampling defaults advertised by the host model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub default_temperature: f32,
    pub default_top_k: u32,
    pub max_top_k: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionOptions {
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub top_k: u32,
}

impl SessionOptions {
    /// Fully deterministic sampling; the output has to parse as JSON.
    pub fn json_generation() -> Self {
        Self {
            system_prompt: Some(JSON_SYSTEM_PROMPT.to_string()),
            temperature: 0.0,
            top_k: 1,
        }
    }

    pub fn interactive(params: &ModelParams) -> Self {
        Self {
            system_prompt: None,
            temperature: params.default_temperature,
            top_k: params.default_top_k.min(INTERACTIVE_TOP_K_LIMIT).min(params.max_top_k),
        }
    }
}

/// One live conversation with the model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelSession: Send + Sync {
    async fn prompt(&self, text: &str) -> Result<String, GenerationError>;
    fn destroy(&self);
}

/// The host's text-generation capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn params(&self) -> Result<ModelParams, GenerationError>;
    async fn create(&self, options: SessionOptions) -> Result<Box<dyn ModelSession>, GenerationError>;
}

/// Owns at most one model session for quiz generation, created on first use.
pub struct GenerationSession {
    model: Arc<dyn LanguageModel>,
    options: SessionOptions,
    session: Mutex<Option<Box<dyn ModelSession>>>,
}

impl GenerationSession {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self::with_options(model, SessionOptions::json_generation())
    }

    pub fn with_options(model: Arc<dyn LanguageModel>, options: SessionOptions) -> Self {
        Self {
            model,
            options,
            session: Mutex::new(None),
        }
    }

    /// Sends `prompt` on the cached session. Any failure drops the session before returning.
    pub async fn run(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut slot = self.session.lock().await;

        if slot.is_none() {
            let created = self.model.create(self.options.clone()).await.map_err(|e| {
                log::warn!("Failed to create model session: {}", e);
                e
            })?;
            *slot = Some(created);
        }

        let outcome = match slot.as_ref() {
            Some(session) => session.prompt(prompt).await,
            None => Err(GenerationError::Model("model session unavailable".to_string())),
        };

        if let Err(e) = &outcome {
            log::warn!("Prompt failed, discarding model session: {}", e);
            if let Some(session) = slot.take() {
                session.destroy();
            }
        }
        outcome
    }

    /// Disposes the cached session, if any.
    pub async fn reset(&self) {
        if let Some(session) = self.session.lock().await.take() {
            session.destroy();
        }
    }

    pub async fn is_active(&self) -> bool {
        self.session.lock().await.is_some()
    }
}

/// Answers a free-form prompt on a throwaway session that is never shared with quiz generation.
pub async fn ask_once(model: &dyn LanguageModel, prompt: &str) -> Result<String, GenerationError> {
    let params = model.params().await?;
    let session = model.create(SessionOptions::interactive(&params)).await?;
    let answer = session.prompt(prompt).await;
    session.destroy();
    answer
}

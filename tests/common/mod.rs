#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use quizgen_server::{
    config::Config,
    errors::GenerationError,
    models::domain::PageContent,
    services::model_service::{LanguageModel, ModelParams, ModelSession, SessionOptions},
};
use secrecy::SecretString;
use serde_json::json;

/// In-memory, model-less configuration with no retry backoff.
pub fn test_config() -> Config {
    Config {
        web_server_host: "127.0.0.1".to_string(),
        web_server_port: 0,
        allowed_origin: None,
        model_api_base: None,
        model_api_key: SecretString::from("test".to_string()),
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

pub fn water_cycle_page() -> PageContent {
    PageContent::new(
        "The Water Cycle",
        "Water evaporates from the ocean. Vapour rises and cools into clouds.\n\
         Clouds release rain. Rivers carry the water back to the sea.",
    )
}

/// Model output holding `mcq` multiple-choice questions followed by `true_false` statements.
pub fn mixed_quiz_json(mcq: usize, true_false: usize) -> String {
    let mut questions = Vec::new();
    for i in 0..mcq {
        questions.push(json!({
            "question": format!("Which answer is right for item {}?", i + 1),
            "type": "mcq",
            "options": ["first", "second", "third", "fourth"],
            "answer_index": i % 4
        }));
    }
    for i in 0..true_false {
        questions.push(json!({
            "question": format!("Statement number {}", i + 1),
            "type": "true_false",
            "answer": i % 2 == 0
        }));
    }
    format!(
        "Sure! Here is your quiz:\n```json\n{}\n```",
        json!({ "source_title": "The Water Cycle", "questions": questions })
    )
}

type Hook = Arc<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
struct Script {
    replies: Mutex<VecDeque<Result<String, String>>>,
    hook: Mutex<Option<Hook>>,
    prompts: AtomicUsize,
}

/// Plays back queued replies; an empty queue fails every prompt.
#[derive(Clone, Default)]
pub struct QueuedModel {
    script: Arc<Script>,
}

impl QueuedModel {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        let model = Self::default();
        *model.script.replies.lock().unwrap() = replies.into();
        model
    }

    /// Runs `hook` with the 1-based prompt number before each reply.
    pub fn on_prompt(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        *self.script.hook.lock().unwrap() = Some(Arc::new(hook));
    }

    pub fn prompt_calls(&self) -> usize {
        self.script.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for QueuedModel {
    async fn params(&self) -> Result<ModelParams, GenerationError> {
        Ok(ModelParams {
            default_temperature: 0.8,
            default_top_k: 40,
            max_top_k: 64,
        })
    }

    async fn create(&self, _options: SessionOptions) -> Result<Box<dyn ModelSession>, GenerationError> {
        Ok(Box::new(QueuedSession {
            script: Arc::clone(&self.script),
        }))
    }
}

struct QueuedSession {
    script: Arc<Script>,
}

#[async_trait]
impl ModelSession for QueuedSession {
    async fn prompt(&self, _text: &str) -> Result<String, GenerationError> {
        let call = self.script.prompts.fetch_add(1, Ordering::SeqCst) + 1;
        let hook = self.script.hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(call);
        }

        match self.script.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GenerationError::Model(message)),
            None => Err(GenerationError::Model("model unavailable".to_string())),
        }
    }

    fn destroy(&self) {}
}

#[cfg(test)]
pub mod fixtures {
    use crate::models::domain::{PageContent, Question, Quiz};

    /// A page with enough sentences to seed a few questions
    pub fn test_page() -> PageContent {
        PageContent::new(
            "The Water Cycle",
            "Water evaporates from oceans. Vapour condenses into clouds.\nRain falls back to the ground",
        )
    }

    /// A quiz with one question of every type
    pub fn sample_quiz() -> Quiz {
        Quiz::new(
            "The Water Cycle",
            vec![
                Question::Mcq {
                    question: "What forms clouds?".to_string(),
                    options: ["Vapour", "Salt", "Rock", "Sand"].map(String::from),
                    answer_index: 0,
                },
                Question::TrueFalse {
                    question: "Rain falls upwards".to_string(),
                    answer: false,
                },
                Question::FillIn {
                    question: "Water ____ from oceans".to_string(),
                    answer: "evaporates".to_string(),
                },
            ],
        )
    }
}

#[cfg(test)]
pub mod fakes {
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };

    use async_trait::async_trait;
    use serde_json::json;

    use crate::{
        errors::GenerationError,
        models::domain::QuestionType,
        services::model_service::{LanguageModel, ModelParams, ModelSession, SessionOptions},
    };

    #[derive(Clone, Debug)]
    pub enum ScriptedReply {
        Text(String),
        Fail(String),
    }

    type Hook = Arc<dyn Fn() + Send + Sync>;

    #[derive(Default)]
    struct Shared {
        replies: Mutex<VecDeque<ScriptedReply>>,
        repeat: Mutex<Option<ScriptedReply>>,
        hook: Mutex<Option<Hook>>,
        prompts: AtomicUsize,
        creates: AtomicUsize,
        destroys: AtomicUsize,
    }

    /// Language model that plays back canned replies and counts how it was used.
    pub struct ScriptedModel {
        shared: Arc<Shared>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<ScriptedReply>) -> Self {
            let shared = Shared::default();
            *shared.replies.lock().unwrap() = replies.into();
            Self {
                shared: Arc::new(shared),
            }
        }

        /// Fails every prompt with the same message
        pub fn failing(message: &str) -> Self {
            let model = Self::new(Vec::new());
            *model.shared.repeat.lock().unwrap() = Some(ScriptedReply::Fail(message.to_string()));
            model
        }

        pub fn on_prompt(&self, hook: impl Fn() + Send + Sync + 'static) {
            *self.shared.hook.lock().unwrap() = Some(Arc::new(hook));
        }

        pub fn prompt_calls(&self) -> usize {
            self.shared.prompts.load(Ordering::SeqCst)
        }

        pub fn create_calls(&self) -> usize {
            self.shared.creates.load(Ordering::SeqCst)
        }

        pub fn destroy_calls(&self) -> usize {
            self.shared.destroys.load(Ordering::SeqCst)
        }

        /// Well-formed model output with one question per entry in `types`
        pub fn quiz_json(types: &[QuestionType]) -> String {
            let questions: Vec<_> = types
                .iter()
                .enumerate()
                .map(|(i, t)| match t {
                    QuestionType::Mcq => json!({
                        "question": format!("Question {}?", i + 1),
                        "type": "mcq",
                        "options": ["a", "b", "c", "d"],
                        "answer_index": i % 4
                    }),
                    QuestionType::TrueFalse => json!({
                        "question": format!("Statement {}", i + 1),
                        "type": "true_false",
                        "answer": i % 2 == 0
                    }),
                    QuestionType::FillIn => json!({
                        "question": format!("Blank {} ____", i + 1),
                        "type": "fill_in",
                        "answer": "word"
                    }),
                })
                .collect();
            json!({ "source_title": "Scripted", "questions": questions }).to_string()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn params(&self) -> Result<ModelParams, GenerationError> {
            Ok(ModelParams {
                default_temperature: 1.0,
                default_top_k: 3,
                max_top_k: 8,
            })
        }

        async fn create(&self, _options: SessionOptions) -> Result<Box<dyn ModelSession>, GenerationError> {
            self.shared.creates.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedSession {
                shared: Arc::clone(&self.shared),
            }))
        }
    }

    struct ScriptedSession {
        shared: Arc<Shared>,
    }

    #[async_trait]
    impl ModelSession for ScriptedSession {
        async fn prompt(&self, _text: &str) -> Result<String, GenerationError> {
            self.shared.prompts.fetch_add(1, Ordering::SeqCst);
            let hook = self.shared.hook.lock().unwrap().clone();
            if let Some(hook) = hook {
                hook();
            }

            let next = self.shared.replies.lock().unwrap().pop_front();
            let reply = next.or_else(|| self.shared.repeat.lock().unwrap().clone());
            match reply {
                Some(ScriptedReply::Text(text)) => Ok(text),
                Some(ScriptedReply::Fail(message)) => Err(GenerationError::Model(message)),
                None => Err(GenerationError::Model("script exhausted".to_string())),
            }
        }

        fn destroy(&self) {
            self.shared.destroys.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::fixtures::*;
    use crate::models::domain::QuestionType;
    use crate::services::model_service::{LanguageModel, SessionOptions};

    #[test]
    fn test_fixtures_sample_quiz() {
        let quiz = sample_quiz();
        assert_eq!(quiz.len(), 3);
        assert_eq!(quiz.count_of(QuestionType::FillIn), 1);
    }

    #[test]
    fn test_fixtures_test_page() {
        let page = test_page();
        assert_eq!(page.title, "The Water Cycle");
    }

    #[tokio::test]
    async fn test_scripted_model_plays_replies_in_order() {
        let model = ScriptedModel::new(vec![
            ScriptedReply::Text("one".to_string()),
            ScriptedReply::Fail("two".to_string()),
        ]);
        let session = model.create(SessionOptions::json_generation()).await.unwrap();

        assert_eq!(session.prompt("p").await.unwrap(), "one");
        assert!(session.prompt("p").await.is_err());
        assert!(session.prompt("p").await.is_err());
        assert_eq!(model.prompt_calls(), 3);
        assert_eq!(model.create_calls(), 1);
    }
}

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    constants::storage_keys::{
        ATTEMPTS_MADE, ERROR, GENERATION_CONFIG, GENERATION_KEYS, IS_LOADING, PAGE_CONTENT,
        TEST_DATA,
    },
    errors::{AppResult, GenerationError},
    models::domain::{GenerationAttempt, GenerationConfig, PageContent, Quiz},
    repositories::KeyValueStore,
    services::{
        fallback_generator::generate_fallback_quiz,
        model_service::{GenerationSession, LanguageModel},
        page_content_service::{PageContentProvider, SnapshotPageProvider},
        prompt_builder::build_quiz_prompt,
        response_extractor::extract_json,
        schema_validator::validate_quiz,
    },
};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }
}

/// Cooperative cancel flag, checked between steps. It never interrupts a model call.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Idle,
    Preparing,
    Prompting,
    Validating,
    Retrying,
    Succeeded,
    Exhausted,
    Cancelled,
    Failed,
}

impl std::fmt::Display for GenerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GenerationState::Idle => "idle",
            GenerationState::Preparing => "preparing",
            GenerationState::Prompting => "prompting",
            GenerationState::Validating => "validating",
            GenerationState::Retrying => "retrying",
            GenerationState::Succeeded => "succeeded",
            GenerationState::Exhausted => "exhausted",
            GenerationState::Cancelled => "cancelled",
            GenerationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Succeeded(Quiz),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub outcome: GenerationOutcome,
    /// Failed attempts before the outcome; zero when the first try succeeded.
    pub attempts_made: u32,
    pub used_fallback: bool,
}

/// Generation status as read back from the durable store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GenerationProgress {
    Idle,
    Loading { attempts_made: u32 },
    Completed { quiz: Quiz, attempts_made: u32 },
    Failed { error: String, attempts_made: u32 },
}

type RunSlot = Arc<Mutex<Option<CancellationFlag>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the single in-flight run; releasing it frees the slot.
pub struct RunGuard {
    slot: RunSlot,
    flag: CancellationFlag,
}

impl RunGuard {
    pub fn flag(&self) -> CancellationFlag {
        self.flag.clone()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        *lock(&self.slot) = None;
    }
}

/// Drives page -> prompt -> model -> extract -> validate, with retries and persisted progress.
pub struct GenerationOrchestrator {
    model: Option<Arc<dyn LanguageModel>>,
    store: Arc<dyn KeyValueStore>,
    policy: RetryPolicy,
    max_source_chars: usize,
    running: RunSlot,
    state: Mutex<GenerationState>,
}

impl GenerationOrchestrator {
    pub fn new(
        model: Option<Arc<dyn LanguageModel>>,
        store: Arc<dyn KeyValueStore>,
        policy: RetryPolicy,
        max_source_chars: usize,
    ) -> Self {
        Self {
            model,
            store,
            policy,
            max_source_chars,
            running: Arc::new(Mutex::new(None)),
            state: Mutex::new(GenerationState::Idle),
        }
    }

    pub fn state(&self) -> GenerationState {
        *lock(&self.state)
    }

    pub fn is_running(&self) -> bool {
        lock(&self.running).is_some()
    }

    fn transition(&self, next: GenerationState) {
        let mut state = lock(&self.state);
        if *state != next {
            log::debug!("Generation {} -> {}", *state, next);
            *state = next;
        }
    }

    /// Claims the single run slot. A second concurrent run is refused.
    pub fn acquire(&self) -> Result<RunGuard, GenerationError> {
        let mut slot = lock(&self.running);
        if slot.is_some() {
            return Err(GenerationError::AlreadyRunning);
        }
        let flag = CancellationFlag::new();
        *slot = Some(flag.clone());
        Ok(RunGuard {
            slot: Arc::clone(&self.running),
            flag,
        })
    }

    /// Requests cancellation of the in-flight run. Returns false when nothing is running.
    pub fn cancel(&self) -> bool {
        match lock(&self.running).as_ref() {
            Some(flag) => {
                log::info!("Cancellation requested");
                flag.cancel();
                true
            }
            None => false,
        }
    }

    /// Runs one generation to completion on the current task.
    pub async fn generate(
        &self,
        config: GenerationConfig,
        provider: Option<&dyn PageContentProvider>,
    ) -> Result<GenerationReport, GenerationError> {
        let guard = self.acquire()?;
        self.run(config, provider, guard.flag()).await
    }

    /// Starts a generation in the background so it outlives the caller.
    pub fn spawn(
        self: &Arc<Self>,
        config: GenerationConfig,
        provider: Option<Arc<dyn PageContentProvider>>,
    ) -> Result<CancellationFlag, GenerationError> {
        let guard = self.acquire()?;
        let flag = guard.flag();
        let orchestrator = Arc::clone(self);

        tokio::spawn(async move {
            let result = orchestrator
                .run(config, provider.as_deref(), guard.flag())
                .await;
            drop(guard);
            match result {
                Ok(report) => log::info!(
                    "Background generation finished after {} failed attempts",
                    report.attempts_made
                ),
                Err(e) => log::error!("Background generation failed: {}", e),
            }
        });

        Ok(flag)
    }

    async fn run(
        &self,
        config: GenerationConfig,
        provider: Option<&dyn PageContentProvider>,
        flag: CancellationFlag,
    ) -> Result<GenerationReport, GenerationError> {
        let config = config.normalized();
        self.transition(GenerationState::Preparing);
        self.clear_outcome().await?;

        if !config.has_types() {
            return Err(self.fail(GenerationError::NoTypeSelected).await);
        }
        let Some(provider) = provider else {
            return Err(self.fail(GenerationError::PageAccessUnavailable).await);
        };

        self.mark_loading(&config).await?;

        let page = match provider.fetch().await {
            Ok(page) => page,
            Err(e) => return Err(self.fail(e).await),
        };
        self.persist(PAGE_CONTENT, serde_json::to_value(&page))
            .await?;

        self.execute(GenerationAttempt::new(config, page), flag).await
    }

    async fn execute(
        &self,
        mut attempt: GenerationAttempt,
        flag: CancellationFlag,
    ) -> Result<GenerationReport, GenerationError> {
        let Some(model) = self.model.as_ref() else {
            log::info!("No language model on this host, using fallback questions");
            let quiz = generate_fallback_quiz(
                &attempt.page,
                &attempt.config.selected_types,
                attempt.config.question_count,
            );
            return self.commit(quiz, &mut attempt, &flag, true).await;
        };

        let source = attempt.page.source_text(self.max_source_chars);
        let prompt = match build_quiz_prompt(
            &attempt.config.selected_types,
            attempt.config.question_count,
            &source,
        ) {
            Ok(prompt) => prompt,
            Err(e) => return Err(self.fail(e).await),
        };

        let session = GenerationSession::new(Arc::clone(model));
        loop {
            if attempt.note_cancellation(flag.is_cancelled()) {
                session.reset().await;
                return self.cancelled(&mut attempt).await;
            }

            self.transition(GenerationState::Prompting);
            let result = self.attempt_once(&session, &prompt, &attempt.page.title).await;

            let error = match result {
                Ok(quiz) => {
                    session.reset().await;
                    return self.commit(quiz, &mut attempt, &flag, false).await;
                }
                Err(e) if !e.is_retryable() => {
                    session.reset().await;
                    return Err(self.fail(e).await);
                }
                Err(e) => e,
            };

            attempt.attempts_made += 1;
            log::warn!("Attempt {} failed: {}", attempt.attempts_made, error);
            self.persist(ATTEMPTS_MADE, Ok(json!(attempt.attempts_made)))
                .await?;

            session.reset().await;
            if attempt.attempts_made >= self.policy.max_attempts {
                self.transition(GenerationState::Exhausted);
                return Err(self
                    .fail(GenerationError::Exhausted {
                        attempts: attempt.attempts_made,
                        last: error.to_string(),
                    })
                    .await);
            }

            self.transition(GenerationState::Retrying);
            tokio::time::sleep(self.policy.backoff).await;
        }
    }

    async fn attempt_once(
        &self,
        session: &GenerationSession,
        prompt: &str,
        page_title: &str,
    ) -> Result<Quiz, GenerationError> {
        let raw = session.run(prompt).await?;
        log::debug!("Raw model output: {}", raw);

        self.transition(GenerationState::Validating);
        let value = extract_json(&raw)?;
        validate_quiz(&value, page_title)
    }

    /// Forgets the previous run's outcome. Runs before any precondition can fail.
    async fn clear_outcome(&self) -> Result<(), GenerationError> {
        self.store.remove(TEST_DATA).await?;
        self.store.remove(ERROR).await?;
        self.store.remove(ATTEMPTS_MADE).await?;
        Ok(())
    }

    async fn mark_loading(&self, config: &GenerationConfig) -> Result<(), GenerationError> {
        self.persist(GENERATION_CONFIG, serde_json::to_value(config))
            .await?;
        self.persist(IS_LOADING, Ok(json!(true))).await
    }

    async fn persist(
        &self,
        key: &str,
        value: Result<Value, serde_json::Error>,
    ) -> Result<(), GenerationError> {
        let value = value.map_err(|e| GenerationError::Storage(e.to_string()))?;
        self.store.set(key, value).await?;
        Ok(())
    }

    /// Drops the snapshot of a finished attempt and clears the loading flag.
    async fn finish_attempt(&self) -> AppResult<()> {
        self.store.remove(GENERATION_CONFIG).await?;
        self.store.remove(PAGE_CONTENT).await?;
        self.store.set(IS_LOADING, json!(false)).await
    }

    async fn commit(
        &self,
        quiz: Quiz,
        attempt: &mut GenerationAttempt,
        flag: &CancellationFlag,
        used_fallback: bool,
    ) -> Result<GenerationReport, GenerationError> {
        if attempt.note_cancellation(flag.is_cancelled()) {
            return self.cancelled(attempt).await;
        }

        self.persist(TEST_DATA, serde_json::to_value(&quiz)).await?;
        self.store.remove(ERROR).await?;
        self.finish_attempt().await?;
        self.transition(GenerationState::Succeeded);

        log::info!(
            "Generated {} questions for '{}'",
            quiz.len(),
            quiz.source_title
        );
        Ok(GenerationReport {
            outcome: GenerationOutcome::Succeeded(quiz),
            attempts_made: attempt.attempts_made,
            used_fallback,
        })
    }

    async fn cancelled(
        &self,
        attempt: &mut GenerationAttempt,
    ) -> Result<GenerationReport, GenerationError> {
        self.finish_attempt().await?;
        self.transition(GenerationState::Cancelled);

        log::info!("Generation cancelled by user");
        Ok(GenerationReport {
            outcome: GenerationOutcome::Cancelled,
            attempts_made: attempt.attempts_made,
            used_fallback: false,
        })
    }

    /// Records a terminal failure so it survives the caller going away, then hands it back.
    async fn fail(&self, error: GenerationError) -> GenerationError {
        log::error!("Generation error: {}", error);
        if self.state() != GenerationState::Exhausted {
            self.transition(GenerationState::Failed);
        }

        let persisted = async {
            self.finish_attempt().await?;
            self.store.set(ERROR, json!(error.to_string())).await
        }
        .await;
        if let Err(e) = persisted {
            log::error!("Failed to persist generation error: {}", e);
        }
        error
    }

    /// Reads the persisted generation status.
    pub async fn progress(&self) -> Result<GenerationProgress, GenerationError> {
        let attempts_made = self
            .store
            .get(ATTEMPTS_MADE)
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        // A run clears testData before raising isLoading, so a quiz next to the flag is this run's.
        if let Some(value) = self.store.get(TEST_DATA).await? {
            let quiz: Quiz = serde_json::from_value(value)
                .map_err(|e| GenerationError::Storage(format!("stored quiz is unreadable: {}", e)))?;
            return Ok(GenerationProgress::Completed { quiz, attempts_made });
        }

        let loading = self
            .store
            .get(IS_LOADING)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if loading {
            return Ok(GenerationProgress::Loading { attempts_made });
        }

        match self.store.get(ERROR).await? {
            Some(Value::String(error)) if !error.is_empty() => {
                Ok(GenerationProgress::Failed { error, attempts_made })
            }
            _ => Ok(GenerationProgress::Idle),
        }
    }

    /// Called when a UI attaches. Restarts a run that was loading when its process went away.
    pub async fn reattach(self: &Arc<Self>) -> Result<GenerationProgress, GenerationError> {
        let progress = self.progress().await?;

        match progress {
            GenerationProgress::Completed { .. } => {
                self.finish_attempt().await?;
                Ok(progress)
            }
            GenerationProgress::Loading { .. } if !self.is_running() => {
                let config = self.stored::<GenerationConfig>(GENERATION_CONFIG).await?;
                let page = self.stored::<PageContent>(PAGE_CONTENT).await?;

                match config {
                    Some(config) => {
                        log::info!("Restarting interrupted generation");
                        let provider: Arc<dyn PageContentProvider> =
                            Arc::new(SnapshotPageProvider::new(page));
                        match self.spawn(config, Some(provider)) {
                            Ok(_) | Err(GenerationError::AlreadyRunning) => {}
                            Err(e) => return Err(e),
                        }
                        Ok(GenerationProgress::Loading { attempts_made: 0 })
                    }
                    None => {
                        let error = self
                            .fail(GenerationError::Storage(
                                "interrupted generation has no stored configuration".to_string(),
                            ))
                            .await;
                        Ok(GenerationProgress::Failed {
                            error: error.to_string(),
                            attempts_made: 0,
                        })
                    }
                }
            }
            other => Ok(other),
        }
    }

    async fn stored<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, GenerationError> {
        match self.store.get(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| GenerationError::Storage(format!("{} is unreadable: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Cancels any run and forgets every generation marker, including the last quiz.
    pub async fn reset(&self) -> Result<(), GenerationError> {
        self.cancel();
        for key in GENERATION_KEYS {
            self.store.remove(key).await?;
        }
        self.transition(GenerationState::Idle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::QuestionType,
        repositories::InMemoryStore,
        test_utils::{
            fakes::{ScriptedModel, ScriptedReply},
            fixtures::sample_quiz,
        },
    };

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(0),
        }
    }

    fn orchestrator(model: Option<Arc<dyn LanguageModel>>) -> (Arc<GenerationOrchestrator>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            model,
            store.clone(),
            policy(),
            200_000,
        ));
        (orchestrator, store)
    }

    fn page_provider() -> SnapshotPageProvider {
        SnapshotPageProvider::new(Some(PageContent::new(
            "Solar System",
            "The sun is a star. Jupiter is the largest planet.",
        )))
    }

    #[test]
    fn test_default_retry_policy_is_three_attempts_half_second() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_empty_type_selection_fails_before_model_use() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let (orchestrator, _) = orchestrator(Some(model.clone()));
        let provider = page_provider();

        let result = orchestrator
            .generate(GenerationConfig::new(Vec::new(), 5), Some(&provider))
            .await;

        assert_eq!(result, Err(GenerationError::NoTypeSelected));
        assert_eq!(model.prompt_calls(), 0);
        assert!(matches!(
            orchestrator.progress().await.unwrap(),
            GenerationProgress::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_page_access_is_terminal() {
        let (orchestrator, _) = orchestrator(None);

        let result = orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 5), None)
            .await;

        assert_eq!(result, Err(GenerationError::PageAccessUnavailable));
    }

    #[tokio::test]
    async fn test_page_fetch_failure_is_not_retried() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let (orchestrator, _) = orchestrator(Some(model.clone()));
        let provider = SnapshotPageProvider::new(None);

        let result = orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 5), Some(&provider))
            .await;

        assert_eq!(
            result,
            Err(GenerationError::PageContent("No active tab found".to_string()))
        );
        assert_eq!(model.prompt_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_model_uses_fallback() {
        let (orchestrator, _) = orchestrator(None);
        let provider = page_provider();

        let report = orchestrator
            .generate(
                GenerationConfig::new([QuestionType::TrueFalse, QuestionType::FillIn], 5),
                Some(&provider),
            )
            .await
            .unwrap();

        assert!(report.used_fallback);
        match report.outcome {
            GenerationOutcome::Succeeded(quiz) => {
                assert_eq!(quiz.len(), 5);
                assert_eq!(quiz.count_of(QuestionType::TrueFalse), 3);
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(orchestrator.state(), GenerationState::Succeeded);
    }

    #[tokio::test]
    async fn test_malformed_output_is_retried_then_succeeds() {
        let model = Arc::new(ScriptedModel::new(vec![
            ScriptedReply::Text("I cannot do that".to_string()),
            ScriptedReply::Text("```json\n{\"questions\": []}\n```".to_string()),
            ScriptedReply::Text(ScriptedModel::quiz_json(&[QuestionType::Mcq; 3])),
        ]));
        let (orchestrator, _) = orchestrator(Some(model.clone()));
        let provider = page_provider();

        let report = orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 3), Some(&provider))
            .await
            .unwrap();

        assert_eq!(report.attempts_made, 2);
        assert_eq!(model.prompt_calls(), 3);
        assert!(matches!(report.outcome, GenerationOutcome::Succeeded(ref q) if q.len() == 3));
    }

    #[tokio::test]
    async fn test_always_failing_model_exhausts_after_three_attempts() {
        let model = Arc::new(ScriptedModel::failing("model crashed"));
        let (orchestrator, store) = orchestrator(Some(model.clone()));
        let provider = page_provider();

        let result = orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 5), Some(&provider))
            .await;

        assert_eq!(
            result,
            Err(GenerationError::Exhausted {
                attempts: 3,
                last: "Model call failed: model crashed".to_string()
            })
        );
        assert_eq!(model.prompt_calls(), 3);
        // Every failed attempt discarded its session, so each retry started a fresh one
        assert_eq!(model.create_calls(), 3);
        assert_eq!(model.destroy_calls(), 3);
        assert_eq!(orchestrator.state(), GenerationState::Exhausted);
        assert_eq!(store.get(IS_LOADING).await.unwrap(), Some(json!(false)));
    }

    #[tokio::test]
    async fn test_cancel_before_retry_stops_model_calls() {
        let model = Arc::new(ScriptedModel::failing("bad output"));
        let (orchestrator, _) = orchestrator(Some(model.clone()));
        let canceller = Arc::clone(&orchestrator);
        model.on_prompt(move || {
            canceller.cancel();
        });
        let provider = page_provider();

        let report = orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 5), Some(&provider))
            .await
            .unwrap();

        assert_eq!(report.outcome, GenerationOutcome::Cancelled);
        assert_eq!(model.prompt_calls(), 1);
        assert_eq!(orchestrator.state(), GenerationState::Cancelled);
        assert_eq!(orchestrator.progress().await.unwrap(), GenerationProgress::Idle);
    }

    #[tokio::test]
    async fn test_cancel_during_successful_call_emits_no_quiz() {
        let model = Arc::new(ScriptedModel::new(vec![ScriptedReply::Text(
            ScriptedModel::quiz_json(&[QuestionType::FillIn; 3]),
        )]));
        let store = Arc::new(InMemoryStore::new());
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            Some(model.clone()),
            store.clone(),
            policy(),
            200_000,
        ));
        let canceller = Arc::clone(&orchestrator);
        model.on_prompt(move || {
            canceller.cancel();
        });
        let provider = page_provider();

        let report = orchestrator
            .generate(GenerationConfig::new([QuestionType::FillIn], 3), Some(&provider))
            .await
            .unwrap();

        assert_eq!(report.outcome, GenerationOutcome::Cancelled);
        assert_eq!(store.get(TEST_DATA).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_second_run_is_rejected_while_one_is_in_flight() {
        let (orchestrator, _) = orchestrator(None);
        let _guard = orchestrator.acquire().unwrap();
        let provider = page_provider();

        let result = orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 5), Some(&provider))
            .await;

        assert_eq!(result, Err(GenerationError::AlreadyRunning));
    }

    #[tokio::test]
    async fn test_failed_run_keeps_no_quiz_and_persists_error() {
        let model = Arc::new(ScriptedModel::failing("no"));
        let (orchestrator, store) = orchestrator(Some(model));
        let provider = page_provider();

        let _ = orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 5), Some(&provider))
            .await;

        assert_eq!(store.get(TEST_DATA).await.unwrap(), None);
        match orchestrator.progress().await.unwrap() {
            GenerationProgress::Failed {
                error,
                attempts_made,
            } => {
                assert!(error.starts_with("Failed after 3 attempts"));
                assert_eq!(attempts_made, 3);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reattach_clears_markers_of_completed_run() {
        let (orchestrator, store) = orchestrator(None);
        let provider = page_provider();
        orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 3), Some(&provider))
            .await
            .unwrap();
        store.set(IS_LOADING, json!(false)).await.unwrap();
        store.set(ATTEMPTS_MADE, json!(1)).await.unwrap();

        store.set(PAGE_CONTENT, json!({ "title": "stale", "text": "stale" })).await.unwrap();

        let progress = orchestrator.reattach().await.unwrap();

        assert!(matches!(
            progress,
            GenerationProgress::Completed { ref quiz, attempts_made: 1 } if quiz.len() == 3
        ));
        assert_eq!(store.get(PAGE_CONTENT).await.unwrap(), None);
        assert_eq!(store.get(IS_LOADING).await.unwrap(), Some(json!(false)));
    }

    #[tokio::test]
    async fn test_reattach_keeps_quiz_written_before_loading_flag_cleared() {
        let model = Arc::new(ScriptedModel::new(vec![ScriptedReply::Text(
            ScriptedModel::quiz_json(&[QuestionType::Mcq; 3]),
        )]));
        let (orchestrator, store) = orchestrator(Some(model.clone()));
        let quiz = sample_quiz();
        store.set(IS_LOADING, json!(true)).await.unwrap();
        store
            .set(
                GENERATION_CONFIG,
                serde_json::to_value(GenerationConfig::new([QuestionType::Mcq], 3)).unwrap(),
            )
            .await
            .unwrap();
        store.set(TEST_DATA, serde_json::to_value(&quiz).unwrap()).await.unwrap();

        let progress = orchestrator.reattach().await.unwrap();

        assert_eq!(
            progress,
            GenerationProgress::Completed {
                quiz,
                attempts_made: 0
            }
        );
        assert!(!orchestrator.is_running());
        assert_eq!(model.prompt_calls(), 0);
        assert_eq!(store.get(IS_LOADING).await.unwrap(), Some(json!(false)));
        assert_eq!(store.get(GENERATION_CONFIG).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_precondition_failure_replaces_previous_quiz() {
        let (orchestrator, store) = orchestrator(None);
        let provider = page_provider();
        orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 3), Some(&provider))
            .await
            .unwrap();

        let result = orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 3), None)
            .await;

        assert_eq!(result, Err(GenerationError::PageAccessUnavailable));
        assert_eq!(store.get(TEST_DATA).await.unwrap(), None);
        assert!(matches!(
            orchestrator.progress().await.unwrap(),
            GenerationProgress::Failed { attempts_made: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_reattach_restarts_interrupted_run_from_snapshot() {
        let (orchestrator, store) = orchestrator(None);
        let config = GenerationConfig::new([QuestionType::TrueFalse], 4);
        store.set(IS_LOADING, json!(true)).await.unwrap();
        store
            .set(GENERATION_CONFIG, serde_json::to_value(&config).unwrap())
            .await
            .unwrap();
        store
            .set(
                PAGE_CONTENT,
                serde_json::to_value(PageContent::new("Saved", "Snapshot text. More")).unwrap(),
            )
            .await
            .unwrap();

        let progress = orchestrator.reattach().await.unwrap();
        assert!(matches!(progress, GenerationProgress::Loading { .. }));

        let mut completed = None;
        for _ in 0..50 {
            if let GenerationProgress::Completed { quiz, .. } = orchestrator.progress().await.unwrap() {
                completed = Some(quiz);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let quiz = completed.expect("restarted run should complete");
        assert_eq!(quiz.source_title, "Saved");
        assert_eq!(quiz.len(), 4);
    }

    #[tokio::test]
    async fn test_reset_forgets_everything() {
        let (orchestrator, store) = orchestrator(None);
        let provider = page_provider();
        orchestrator
            .generate(GenerationConfig::new([QuestionType::Mcq], 3), Some(&provider))
            .await
            .unwrap();

        orchestrator.reset().await.unwrap();

        assert_eq!(orchestrator.progress().await.unwrap(), GenerationProgress::Idle);
        assert_eq!(store.get(TEST_DATA).await.unwrap(), None);
        assert_eq!(orchestrator.state(), GenerationState::Idle);
    }
}

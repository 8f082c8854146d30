use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    repositories::{InMemoryStore, JsonFileStore, KeyValueStore, KvSavedTestRepository},
    services::{
        generation_orchestrator::GenerationOrchestrator, model_service::LanguageModel,
        openai_model::OpenAiLanguageModel, saved_test_service::SavedTestService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub saved_test_service: Arc<SavedTestService>,
    pub model: Option<Arc<dyn LanguageModel>>,
    pub http_client: reqwest::Client,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.store_path {
            Some(path) => Arc::new(JsonFileStore::open(path).await?),
            None => {
                log::warn!("STORE_PATH not set, generation state will not survive a restart");
                Arc::new(InMemoryStore::new())
            }
        };

        let model = OpenAiLanguageModel::from_config(&config)
            .map(|m| Arc::new(m) as Arc<dyn LanguageModel>);
        if model.is_none() {
            log::warn!("MODEL_API_BASE not set, quizzes will use fallback questions");
        }

        Ok(Self::from_parts(config, store, model))
    }

    pub fn from_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        model: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            model.clone(),
            Arc::clone(&store),
            config.retry_policy(),
            config.max_source_chars,
        ));

        let saved_test_repository = Arc::new(KvSavedTestRepository::new(store));
        let saved_test_service = Arc::new(SavedTestService::new(saved_test_repository));

        Self {
            orchestrator,
            saved_test_service,
            model,
            http_client: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }
}

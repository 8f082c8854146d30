pub mod fallback_generator;
pub mod generation_orchestrator;
pub mod grading_service;
pub mod model_service;
pub mod openai_model;
pub mod page_content_service;
pub mod prompt_builder;
pub mod response_extractor;
pub mod saved_test_service;
pub mod schema_validator;

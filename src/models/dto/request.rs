use serde::Deserialize;
use validator::Validate;

use crate::models::domain::{
    generation::{MAX_QUESTION_COUNT, MIN_QUESTION_COUNT},
    GenerationConfig, PageContent, QuestionType, Quiz, UserAnswers,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuizRequestDto {
    #[validate(length(min = 1, message = "Please select at least one test type"))]
    pub selected_types: Vec<QuestionType>,

    #[validate(range(min = 3, max = 30))]
    pub question_count: u32,

    /// Snapshot of the active tab, captured by the extension.
    pub page: Option<PageContent>,

    /// Alternatively, a page the server fetches itself.
    #[validate(url)]
    pub url: Option<String>,
}

impl GenerateQuizRequestDto {
    pub fn config(&self) -> GenerationConfig {
        GenerationConfig::new(
            self.selected_types.iter().copied(),
            self.question_count
                .clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT),
        )
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AskRequestDto {
    #[validate(length(min = 1, max = 20000))]
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveTestRequestDto {
    pub quiz: Quiz,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveProgressRequestDto {
    #[serde(default)]
    pub user_answers: UserAnswers,
    pub current_question: Option<usize>,
    pub time_left: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswersRequestDto {
    #[serde(default)]
    pub user_answers: UserAnswers,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTestsParams {
    #[serde(default)]
    pub include_archived: bool,
}

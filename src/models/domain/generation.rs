use serde::{Deserialize, Serialize};

use crate::models::domain::{page_content::PageContent, quiz_question::QuestionType};

pub const MIN_QUESTION_COUNT: u32 = 3;
pub const MAX_QUESTION_COUNT: u32 = 30;

/// What the user asked for. Only changed between runs, never during one.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Selection order is significant: it decides which types get the remainder.
    pub selected_types: Vec<QuestionType>,
    pub question_count: u32,
}

impl GenerationConfig {
    pub fn new(selected_types: impl IntoIterator<Item = QuestionType>, question_count: u32) -> Self {
        let mut types: Vec<QuestionType> = Vec::new();
        for question_type in selected_types {
            if !types.contains(&question_type) {
                types.push(question_type);
            }
        }
        GenerationConfig {
            selected_types: types,
            question_count: question_count.clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT),
        }
    }

    /// Deduplicated and clamped copy, for configs that arrived over the wire or from storage.
    pub fn normalized(&self) -> Self {
        GenerationConfig::new(self.selected_types.iter().copied(), self.question_count)
    }

    pub fn has_types(&self) -> bool {
        !self.selected_types.is_empty()
    }
}

/// Transient state of one run, persisted only so it can be restarted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationAttempt {
    pub config: GenerationConfig,
    pub page: PageContent,
    pub attempts_made: u32,
    pub cancelled: bool,
}

impl GenerationAttempt {
    pub fn new(config: GenerationConfig, page: PageContent) -> Self {
        GenerationAttempt {
            config,
            page,
            attempts_made: 0,
            cancelled: false,
        }
    }

    /// Latches a cancel request. Once cancelled, the attempt stays cancelled.
    pub fn note_cancellation(&mut self, requested: bool) -> bool {
        self.cancelled |= requested;
        self.cancelled
    }
}

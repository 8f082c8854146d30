use serde::Serialize;

use crate::{
    models::domain::{Quiz, SavedTestRecord},
    services::{
        generation_orchestrator::{GenerationProgress, GenerationState},
        grading_service::Grade,
    },
};

/// What the popup needs to tell "working" from "failed" from "done".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationStatusDto {
    pub state: &'static str,
    pub phase: GenerationState,
    pub attempts_made: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationStatusDto {
    pub fn from_progress(progress: GenerationProgress, phase: GenerationState) -> Self {
        match progress {
            GenerationProgress::Idle => Self {
                state: "idle",
                phase,
                attempts_made: 0,
                quiz: None,
                error: None,
            },
            GenerationProgress::Loading { attempts_made } => Self {
                state: "loading",
                phase,
                attempts_made,
                quiz: None,
                error: None,
            },
            GenerationProgress::Completed { quiz, attempts_made } => Self {
                state: "completed",
                phase,
                attempts_made,
                quiz: Some(quiz),
                error: None,
            },
            GenerationProgress::Failed {
                error,
                attempts_made,
            } => Self {
                state: "failed",
                phase,
                attempts_made,
                quiz: None,
                error: Some(error),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponseDto {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitAnswersResponseDto {
    pub record: SavedTestRecord,
    pub grade: Grade,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

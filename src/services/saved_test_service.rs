use std::sync::Arc;

use chrono::Utc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Quiz, SavedTestRecord, UserAnswers},
    repositories::SavedTestRepository,
    services::grading_service::{Grade, GradingService},
};

pub struct SavedTestService {
    repository: Arc<dyn SavedTestRepository>,
}

impl SavedTestService {
    pub fn new(repository: Arc<dyn SavedTestRepository>) -> Self {
        Self { repository }
    }

    pub async fn save_quiz(&self, quiz: Quiz) -> AppResult<SavedTestRecord> {
        if quiz.is_empty() {
            return Err(AppError::ValidationError(
                "Cannot save a test without questions".to_string(),
            ));
        }
        let record = self.repository.insert(SavedTestRecord::from_quiz(quiz)).await?;
        log::info!("Saved test {} ('{}')", record.id, record.title);
        Ok(record)
    }

    /// Newest first; archived records only when asked for.
    pub async fn list(&self, include_archived: bool) -> AppResult<Vec<SavedTestRecord>> {
        let mut records: Vec<SavedTestRecord> = self
            .repository
            .list()
            .await?
            .into_iter()
            .filter(|r| include_archived || !r.is_archived)
            .collect();
        records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> AppResult<SavedTestRecord> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Saved test with id '{}' not found", id)))
    }

    pub async fn save_progress(
        &self,
        id: &str,
        user_answers: UserAnswers,
        current_question: Option<usize>,
        time_left: Option<u32>,
    ) -> AppResult<SavedTestRecord> {
        let mut record = self.get(id).await?;
        if record.is_completed {
            return Err(AppError::Conflict(format!("Saved test '{}' is already completed", id)));
        }
        if let Some(index) = current_question {
            if index >= record.quiz.len() {
                return Err(AppError::ValidationError(format!(
                    "current_question {} is out of range",
                    index
                )));
            }
        }

        record.user_answers = user_answers;
        record.current_question = current_question;
        record.time_left = time_left;
        self.repository.update(record).await
    }

    /// Grades the answers and marks the record completed.
    pub async fn complete(
        &self,
        id: &str,
        user_answers: UserAnswers,
    ) -> AppResult<(SavedTestRecord, Grade)> {
        let mut record = self.get(id).await?;
        let grade = GradingService::grade(&record.quiz, &user_answers);

        record.user_answers = user_answers;
        record.is_completed = true;
        record.completed_at = Some(Utc::now());
        record.score = Some(grade.score);
        record.percentage = Some(grade.percentage);
        record.time_left = None;

        let record = self.repository.update(record).await?;
        log::info!(
            "Completed test {} with {}/{}",
            record.id,
            grade.score,
            grade.total
        );
        Ok((record, grade))
    }

    pub async fn set_archived(&self, id: &str, archived: bool) -> AppResult<SavedTestRecord> {
        let mut record = self.get(id).await?;
        record.is_archived = archived;
        self.repository.update(record).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.repository.delete(id).await
    }
}

use serde::Serialize;

use crate::models::domain::{Question, Quiz, UserAnswer, UserAnswers};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub index: usize,
    pub is_correct: bool,
    pub user_answer: Option<String>,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grade {
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub results: Vec<QuestionResult>,
}

impl Grade {
    pub fn incorrect(&self) -> u32 {
        self.total - self.score
    }
}

pub struct GradingService;

impl GradingService {
    /// Scores every question; an unanswered question counts as wrong.
    pub fn grade(quiz: &Quiz, answers: &UserAnswers) -> Grade {
        let results: Vec<QuestionResult> = quiz
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let answer = answers.get(&index);
                QuestionResult {
                    index,
                    is_correct: answer.is_some_and(|a| Self::is_correct(question, a)),
                    user_answer: answer.map(|a| Self::describe_answer(question, a)),
                    correct_answer: question.correct_answer_text(),
                }
            })
            .collect();

        let score = results.iter().filter(|r| r.is_correct).count() as u32;
        let total = results.len() as u32;
        let percentage = if total == 0 {
            0.0
        } else {
            f64::from(score) / f64::from(total) * 100.0
        };

        Grade {
            score,
            total,
            percentage,
            results,
        }
    }

    fn is_correct(question: &Question, answer: &UserAnswer) -> bool {
        match (question, answer) {
            (Question::Mcq { answer_index, .. }, UserAnswer::Choice(choice)) => {
                *choice == *answer_index as usize
            }
            (Question::TrueFalse { answer, .. }, UserAnswer::Verdict(verdict)) => answer == verdict,
            (Question::FillIn { answer, .. }, UserAnswer::Text(text)) => {
                text.trim().to_lowercase() == answer.trim().to_lowercase()
            }
            _ => false,
        }
    }

    fn describe_answer(question: &Question, answer: &UserAnswer) -> String {
        match (question, answer) {
            (Question::Mcq { options, .. }, UserAnswer::Choice(choice)) => options
                .get(*choice)
                .cloned()
                .unwrap_or_else(|| "No answer".to_string()),
            _ => answer.to_string(),
        }
    }
}

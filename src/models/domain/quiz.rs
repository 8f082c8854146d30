use serde::{Deserialize, Serialize};

use crate::models::domain::quiz_question::{Question, QuestionType};

/// The validated output of one successful generation. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub source_title: String,
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn new(source_title: impl Into<String>, questions: Vec<Question>) -> Self {
        Quiz {
            source_title: source_title.into(),
            questions,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question types in quiz order.
    pub fn type_sequence(&self) -> Vec<QuestionType> {
        self.questions.iter().map(Question::question_type).collect()
    }

    pub fn count_of(&self, question_type: QuestionType) -> usize {
        self.questions
            .iter()
            .filter(|q| q.question_type() == question_type)
            .count()
    }
}

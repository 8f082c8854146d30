use serde::{Deserialize, Serialize};

/// Number of options every multiple-choice question carries.
pub const MCQ_OPTION_COUNT: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Copy, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,       // Four options, one correct index
    TrueFalse, // Boolean statement
    FillIn,    // Sentence with a blank, string answer
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::TrueFalse => "true_false",
            QuestionType::FillIn => "fill_in",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated question, tagged on the wire by its `type` field.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    Mcq {
        question: String,
        options: [String; MCQ_OPTION_COUNT],
        answer_index: u8,
    },
    TrueFalse {
        question: String,
        answer: bool,
    },
    FillIn {
        question: String,
        answer: String,
    },
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        match self {
            Question::Mcq { .. } => QuestionType::Mcq,
            Question::TrueFalse { .. } => QuestionType::TrueFalse,
            Question::FillIn { .. } => QuestionType::FillIn,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::Mcq { question, .. }
            | Question::TrueFalse { question, .. }
            | Question::FillIn { question, .. } => question,
        }
    }

    /// Human-readable correct answer; the option text for multiple choice.
    pub fn correct_answer_text(&self) -> String {
        match self {
            Question::Mcq {
                options,
                answer_index,
                ..
            } => options
                .get(*answer_index as usize)
                .cloned()
                .unwrap_or_default(),
            Question::TrueFalse { answer, .. } => answer.to_string(),
            Question::FillIn { answer, .. } => answer.clone(),
        }
    }

    /// Field-level checks serde cannot express.
    pub fn check_shape(&self) -> Result<(), String> {
        if self.text().trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        match self {
            Question::Mcq { answer_index, .. } if *answer_index as usize >= MCQ_OPTION_COUNT => {
                Err(format!("answer_index {} is out of range 0-3", answer_index))
            }
            Question::FillIn { answer, .. } if answer.trim().is_empty() => {
                Err("fill_in answer is empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

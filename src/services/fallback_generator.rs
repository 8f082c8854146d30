use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    models::domain::{PageContent, Question, QuestionType, Quiz},
    services::prompt_builder::split_counts,
};

const SNIPPET_CHARS: usize = 80;
const UNTITLED: &str = "Untitled Page";

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.\n]\s+").expect("SENTENCE_BREAK is a valid regex pattern"));

fn placeholder_options() -> [String; 4] {
    ["Option A", "Option B", "Option C", "Option D"].map(String::from)
}

fn from_sentence(question_type: QuestionType, number: usize, sentence: &str) -> Question {
    match question_type {
        QuestionType::Mcq => Question::Mcq {
            question: format!(
                "Question {}: What does this statement refer to? {}",
                number, sentence
            ),
            options: placeholder_options(),
            answer_index: 0,
        },
        QuestionType::TrueFalse => Question::TrueFalse {
            question: format!("True or False: {}?", sentence),
            answer: true,
        },
        QuestionType::FillIn => Question::FillIn {
            question: format!("Fill in the blank: {} ____", sentence),
            answer: "answer".to_string(),
        },
    }
}

fn placeholder(question_type: QuestionType, number: usize) -> Question {
    match question_type {
        QuestionType::Mcq => Question::Mcq {
            question: format!("Question {}: Select the correct answer", number),
            options: placeholder_options(),
            answer_index: 0,
        },
        QuestionType::TrueFalse => Question::TrueFalse {
            question: format!("True or False: Placeholder statement {}", number),
            answer: true,
        },
        QuestionType::FillIn => Question::FillIn {
            question: format!("Fill in the blank: Placeholder sentence {} ____", number),
            answer: "answer".to_string(),
        },
    }
}

/// Builds a well-formed quiz from page sentences when no model is available. Never fails.
pub fn generate_fallback_quiz(page: &PageContent, selected_types: &[QuestionType], count: u32) -> Quiz {
    let title = if page.title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        page.title.clone()
    };
    if selected_types.is_empty() {
        return Quiz::new(title, Vec::new());
    }

    let sentences: Vec<String> = SENTENCE_BREAK
        .split(&page.text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.chars().take(SNIPPET_CHARS).collect())
        .collect();

    let mut questions = Vec::with_capacity(count as usize);
    let mut next_sentence = 0;
    for (question_type, type_count) in split_counts(selected_types, count) {
        for _ in 0..type_count {
            let number = questions.len() + 1;
            let question = match sentences.get(next_sentence) {
                Some(sentence) => from_sentence(question_type, number, sentence),
                None => placeholder(question_type, number),
            };
            next_sentence += 1;
            questions.push(question);
        }
    }

    Quiz::new(title, questions)
}

use serde_json::Value;

use crate::{
    errors::GenerationError,
    models::domain::{Question, Quiz},
};

/// Shallow gate: `questions` must be a non-empty array. Says nothing about its elements.
pub fn check_questions_present(value: &Value) -> Result<&Vec<Value>, GenerationError> {
    match value.get("questions").and_then(Value::as_array) {
        Some(questions) if !questions.is_empty() => Ok(questions),
        _ => Err(GenerationError::InvalidFormat(
            "expected a non-empty \"questions\" array".to_string(),
        )),
    }
}

/// Turns extracted JSON into a quiz, rejecting any question whose fields don't match its type.
pub fn validate_quiz(value: &Value, fallback_title: &str) -> Result<Quiz, GenerationError> {
    let raw_questions = check_questions_present(value)?;

    let mut questions = Vec::with_capacity(raw_questions.len());
    for (index, raw) in raw_questions.iter().enumerate() {
        let question: Question = serde_json::from_value(raw.clone()).map_err(|e| {
            GenerationError::InvalidFormat(format!("question {}: {}", index + 1, e))
        })?;
        question
            .check_shape()
            .map_err(|reason| GenerationError::InvalidFormat(format!("question {}: {}", index + 1, reason)))?;
        questions.push(question);
    }

    let source_title = value
        .get("source_title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(fallback_title);

    Ok(Quiz::new(source_title, questions))
}

use crate::{
    constants::quiz_prompt::{
        FILL_IN_FIELDS, MCQ_FIELDS, OUTPUT_HEADER, OUTPUT_SHAPE, RULES, TRUE_FALSE_FIELDS,
    },
    errors::GenerationError,
    models::domain::QuestionType,
};

/// Splits `count` across `types` in selection order. The first `count % len` types get one extra.
pub fn split_counts(types: &[QuestionType], count: u32) -> Vec<(QuestionType, u32)> {
    if types.is_empty() {
        return Vec::new();
    }
    let type_count = types.len() as u32;
    let base = count / type_count;
    let remainder = count % type_count;

    types
        .iter()
        .enumerate()
        .map(|(index, question_type)| {
            let extra = if (index as u32) < remainder { 1 } else { 0 };
            (*question_type, base + extra)
        })
        .collect()
}

fn type_instruction(question_type: QuestionType, count: u32) -> String {
    let (label, fields) = match question_type {
        QuestionType::Mcq => ("multiple-choice", MCQ_FIELDS),
        QuestionType::TrueFalse => ("true/false", TRUE_FALSE_FIELDS),
        QuestionType::FillIn => ("fill-in-the-blank", FILL_IN_FIELDS),
    };
    format!(
        "Generate exactly {} {} questions. Each question must have:\n{}",
        count, label, fields
    )
}

/// Builds the single instruction sent to the model for one generation run.
pub fn build_quiz_prompt(
    selected_types: &[QuestionType],
    count: u32,
    page_text: &str,
) -> Result<String, GenerationError> {
    if selected_types.is_empty() {
        return Err(GenerationError::NoTypeSelected);
    }

    let requirements = split_counts(selected_types, count)
        .into_iter()
        .map(|(question_type, n)| type_instruction(question_type, n))
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(format!(
        "Generate exactly {count} questions from the content below, distributed across the selected question types.

{OUTPUT_HEADER}

{OUTPUT_SHAPE}

Requirements:
{requirements}

Rules:
- Total questions must be exactly {count}
{RULES}

Content:
{page_text}"
    ))
}

pub const JSON_SYSTEM_PROMPT: &str = "You generate valid JSON with no additional text.";

pub const OUTPUT_HEADER: &str = "Output ONLY valid JSON (no markdown, no code fences).";

pub const OUTPUT_SHAPE: &str = r#"{
  "source_title": "title here",
  "questions": [
    {
      "question": "question or statement text",
      "type": "mcq" | "true_false" | "fill_in",
      "options": ["option A", "option B", "option C", "option D"],  // Only for "mcq"
      "answer_index": 0,  // Only for "mcq" (0, 1, 2, or 3)
      "answer": true  // For "true_false" (boolean) or "fill_in" (string)
    }
  ]
}"#;

pub const MCQ_FIELDS: &str = r#"- "question": "question text"
- "options": ["option A", "option B", "option C", "option D"]
- "answer_index": 0 (must be 0, 1, 2, or 3)
- "type": "mcq""#;

pub const TRUE_FALSE_FIELDS: &str = r#"- "question": "statement text"
- "answer": true or false (boolean)
- "type": "true_false""#;

pub const FILL_IN_FIELDS: &str = r#"- "question": "Sentence with a ____ blank"
- "answer": "missing_word_or_phrase" (string)
- "type": "fill_in""#;

pub const RULES: &str = r#"- Each question must include a "type" field: "mcq", "true_false", or "fill_in"
- MCQ questions must have exactly 4 options and answer_index (0-3)
- True/False questions must have boolean answer (true or false)
- Fill-in questions must have string answer
- Output valid JSON only
- Distribute questions evenly across selected types"#;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::ExtractError;

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```json\s*").expect("JSON_FENCE is a valid regex pattern"));
static BARE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```\s*").expect("BARE_FENCE is a valid regex pattern"));
static TRAILING_COMMA_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r",\s*\}").expect("TRAILING_COMMA_OBJECT is a valid regex pattern")
});
static TRAILING_COMMA_ARRAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r",\s*\]").expect("TRAILING_COMMA_ARRAY is a valid regex pattern")
});

fn parse(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn strip_code_fences(text: &str) -> String {
    let without_json = JSON_FENCE.replace_all(text, "");
    BARE_FENCE.replace_all(&without_json, "").into_owned()
}

/// Drops trailing commas and flattens control whitespace that breaks string literals.
pub fn repair_json(text: &str) -> String {
    let fixed = TRAILING_COMMA_OBJECT.replace_all(text, "}");
    let fixed = TRAILING_COMMA_ARRAY.replace_all(&fixed, "]");
    fixed.replace('\n', " ").replace('\r', "").replace('\t', " ")
}

/// Recovers a JSON value from raw model output, trying progressively more invasive fixes.
pub fn extract_json(raw: &str) -> Result<Value, ExtractError> {
    let trimmed = raw.trim();
    if let Ok(value) = parse(trimmed) {
        return Ok(value);
    }

    let cleaned = strip_code_fences(trimmed);
    if let Ok(value) = parse(cleaned.trim()) {
        log::debug!("Recovered JSON after stripping code fences");
        return Ok(value);
    }

    let (first, last) = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(first), Some(last)) if first < last => (first, last),
        _ => return Err(ExtractError::NoJsonFound),
    };
    let candidate = &cleaned[first..=last];
    if let Ok(value) = parse(candidate) {
        log::debug!("Recovered JSON from brace slice");
        return Ok(value);
    }

    parse(&repair_json(candidate)).map_err(|e| {
        log::warn!("JSON recovery failed: {}", e);
        ExtractError::Parse(e.to_string())
    })
}

use serde::{Deserialize, Serialize};

/// Immutable snapshot of the active tab, captured once per generation attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageContent {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub favicon: String,
}

impl PageContent {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        PageContent {
            title: title.into(),
            text: text.into(),
            favicon: String::new(),
        }
    }

    /// Title and body joined, cut to at most `max_chars` characters.
    pub fn source_text(&self, max_chars: usize) -> String {
        format!("{}\n\n{}", self.title, self.text)
            .chars()
            .take(max_chars)
            .collect()
    }
}

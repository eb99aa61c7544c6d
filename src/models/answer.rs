use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::quiz::{answer_field, QuizItem};

/// A submitted value for one quiz item. Stored as a plain JSON scalar:
/// `true`/`false`, an option index, free text, or `null` when the input was
/// missing or could not be interpreted for the item's variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Index(i64),
    Text(String),
    Unanswered,
}

impl Answer {
    /// Interprets a raw form value according to the variant of `item`.
    pub fn from_form_value(item: &QuizItem, raw: Option<&str>) -> Self {
        match item {
            QuizItem::TrueFalse { .. } => match raw.map(str::trim) {
                Some("true") => Answer::Bool(true),
                Some("false") => Answer::Bool(false),
                _ => Answer::Unanswered,
            },
            QuizItem::MultipleChoice { .. } => raw
                .and_then(|v| v.trim().parse::<i64>().ok())
                .map(Answer::Index)
                .unwrap_or(Answer::Unanswered),
            QuizItem::Discursive { .. } => Answer::Text(raw.unwrap_or_default().to_string()),
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Answer::Text(text) => text,
            _ => "",
        }
    }
}

/// Reads `q_{i}` for every item, positionally aligned with `items`.
pub fn collect_form_answers(items: &[QuizItem], form: &HashMap<String, String>) -> Vec<Answer> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let raw = form.get(&answer_field(idx)).map(String::as_str);
            Answer::from_form_value(item, raw)
        })
        .collect()
}

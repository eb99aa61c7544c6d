//! Pulls a JSON value out of free-form model output.
//!
//! Models wrap JSON in code fences, precede it with a sentence of prose, or
//! trail it with commentary. The lookup order is: the body of a fenced block,
//! then the whole text, then the first object or array that parses starting
//! at any `{` or `[`.

use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

fn fenced_block() -> &'static Regex {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    FENCED.get_or_init(|| {
        Regex::new(r"(?is)```(?:json)?\s*(\{.*\}|\[.*\])\s*```").expect("static regex")
    })
}

/// Only candidates for which `accept` holds are returned, so bracketed
/// fragments of prose such as `[1]` can be skipped.
pub fn extract_json_where<F>(raw: &str, accept: F) -> Option<JsonValue>
where
    F: Fn(&JsonValue) -> bool,
{
    if let Some(caps) = fenced_block().captures(raw) {
        if let Some(value) = caps.get(1).and_then(|m| first_value(m.as_str(), &accept)) {
            return Some(value);
        }
    }

    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<JsonValue>(trimmed) {
        if (value.is_object() || value.is_array()) && accept(&value) {
            return Some(value);
        }
    }

    first_value(raw, &accept)
}

/// Scans for the first `{`/`[` that starts a complete JSON document accepted
/// by `accept`, ignoring whatever follows it.
fn first_value<F>(text: &str, accept: &F) -> Option<JsonValue>
where
    F: Fn(&JsonValue) -> bool,
{
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .find_map(|(idx, _)| {
            let mut stream = serde_json::Deserializer::from_str(&text[idx..]).into_iter::<JsonValue>();
            match stream.next() {
                Some(Ok(value)) if (value.is_object() || value.is_array()) && accept(&value) => {
                    Some(value)
                }
                _ => None,
            }
        })
}

use regex::Regex;
use std::sync::OnceLock;

fn whitespace_run() -> &'static Regex {
    static WS: OnceLock<Regex> = OnceLock::new();
    WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Collapses line breaks, tabs and repeated spaces into single spaces.
pub fn clean_text(raw: &str) -> String {
    whitespace_run().replace_all(raw, " ").trim().to_string()
}

/// Naive summary: the first `n` non-empty sentences split on ". ".
pub fn first_sentences(text: &str, n: usize) -> Vec<String> {
    text.split(". ")
        .take(n)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Cuts to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

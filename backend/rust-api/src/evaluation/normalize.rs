use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::models::quiz::text_of;

lazy_static! {
    // "Option A: ", "topic b - ", "Option) ", "Topic C – "
    static ref PLACEHOLDER_PREFIX: Regex =
        Regex::new(r"(?i)^(?:option|topic)\b\s*(?:[a-d]\b)?\s*[:\-–—)]?\s*").unwrap();

    // "A) ", "b. ", "C: ", "d- ". Punctuation must follow the letter directly
    // and whitespace must follow the punctuation, so "d - x" and "A)Paris" stay.
    static ref LETTER_LABEL: Regex = Regex::new(r"(?i)^[a-d][.)\-:]\s+").unwrap();

    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Cleans option/answer text so formatting differences do not affect
/// comparison: "Option A: Paris", "A) Paris" and "Paris" all become "Paris".
///
/// Each prefix is stripped at most once and only at the start. Case is
/// preserved.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_placeholder = PLACEHOLDER_PREFIX.replace(trimmed, "");
    let without_label = LETTER_LABEL.replace(&without_placeholder, "");
    WHITESPACE_RUN
        .replace_all(&without_label, " ")
        .trim()
        .to_string()
}

/// Normalizes a loosely typed JSON value; numbers keep their textual form
/// (`0` becomes `"0"`), `null` becomes `""`.
pub fn normalize_value(raw: &Value) -> String {
    text_of(raw).map(|s| normalize(&s)).unwrap_or_default()
}

//! Turns unreliable model text into schema-conformant values.
//!
//! Parsing never fails: [`normalize`] walks a recovery ladder and falls back to
//! the schema's static default when nothing parses.

mod schema;

use serde_json::{Map, Value};

pub use schema::{PaperAnalysis, PaperMetadata, Significance, SocialContent, MAX_THREAD_LEN};

/// A fixed output shape that can be rebuilt from any parsed JSON object.
pub trait Normalize: Sized {
    /// Value returned when the model text contains no usable JSON object.
    fn fallback() -> Self;

    /// Merges `object` over the all-empty shape. Missing or mistyped fields
    /// become empty values.
    fn reconcile(object: &Map<String, Value>) -> Self;
}

pub fn normalize<T: Normalize>(raw: &str) -> T {
    match recover_object(raw) {
        Some(object) => T::reconcile(&object),
        None => {
            tracing::debug!("Model output held no JSON object, using fallback");
            T::fallback()
        }
    }
}

/// Recovery ladder, first success wins: the raw text, the text with code
/// fences and a `json:` label stripped, then the outermost `{...}` span.
pub fn recover_object(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();
    parse_object(trimmed)
        .or_else(|| parse_object(strip_wrapping(trimmed)))
        .or_else(|| outer_braces(trimmed).and_then(parse_object))
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(text).ok()? {
        Value::Object(object) => Some(object),
        _ => None,
    }
}

fn strip_wrapping(text: &str) -> &str {
    let mut text = text.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string (```json) up to the first line break.
        text = match rest.find('\n') {
            Some(idx) if !rest[..idx].contains('{') => &rest[idx + 1..],
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    let text = text.trim();
    match text.get(..5) {
        Some(label) if label.eq_ignore_ascii_case("json:") => text[5..].trim(),
        _ => text,
    }
}

fn outer_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

pub(crate) fn string_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn object_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    object.get(key).and_then(Value::as_object)
}

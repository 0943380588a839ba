use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::schema::EntityRecord;

/// Body of the first fenced code block, with an optional language tag.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply contains no JSON")]
    NoJson,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an array or object of entities, found {0}")]
    Shape(&'static str),
}

/// Parse a chat reply into entity records.
///
/// Tries, in order: the body of a fenced code block, the bracketed span inside
/// that body, the bracketed span of the whole reply, and the reply as-is. The
/// first candidate that is valid JSON wins.
pub fn parse_entities(reply: &str) -> Result<Vec<EntityRecord>, ReplyError> {
    let mut last_error = ReplyError::NoJson;

    for candidate in candidates(reply) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return into_records(value),
            Err(e) => last_error = ReplyError::Json(e),
        }
    }

    Err(last_error)
}

fn candidates(reply: &str) -> Vec<&str> {
    let mut found = Vec::new();

    if let Some(body) = FENCED_BLOCK.captures(reply).and_then(|c| c.get(1)) {
        let body = body.as_str().trim();
        found.push(body);
        if let Some(span) = bracketed_span(body) {
            found.push(span);
        }
    }
    if let Some(span) = bracketed_span(reply) {
        found.push(span);
    }

    let trimmed = reply.trim();
    if !trimmed.is_empty() {
        found.push(trimmed);
    }

    found.dedup();
    found
}

/// From the first `[` or `{` to the last matching closer.
fn bracketed_span(text: &str) -> Option<&str> {
    let start = text.find(['[', '{'])?;
    let closer = if text[start..].starts_with('[') { ']' } else { '}' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

fn into_records(value: Value) -> Result<Vec<EntityRecord>, ReplyError> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(mut map) => match map.remove("entities") {
            Some(entities @ Value::Array(_)) => Ok(serde_json::from_value(entities)?),
            Some(other) => {
                map.insert("entities".to_string(), other);
                Ok(vec![serde_json::from_value(Value::Object(map))?])
            }
            None => Ok(vec![serde_json::from_value(Value::Object(map))?]),
        },
        Value::String(_) => Err(ReplyError::Shape("a string")),
        Value::Number(_) => Err(ReplyError::Shape("a number")),
        Value::Bool(_) => Err(ReplyError::Shape("a boolean")),
        Value::Null => Err(ReplyError::Shape("null")),
    }
}

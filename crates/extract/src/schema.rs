use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One span the model tagged in the document.
///
/// The model decides the exact field set, so missing fields fall back to
/// defaults and anything extra is carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub confidence_score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityRecord {
    pub fn new(text: impl Into<String>, category: impl Into<String>, confidence_score: f64) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            confidence_score,
            extra: Map::new(),
        }
    }
}

/// Strings pass through, `null` becomes `""` and any other value keeps its JSON spelling.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Accepts `0.9`, `"0.9"` or `null`; anything unreadable becomes 0.0.
fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

//! Response body decoding.
//!
//! Providers answer token and API calls with JSON, with form-encoded pairs, or
//! with plain text. [`decode`] tries those shapes in that order and never fails:
//! anything it cannot structure comes back as [`Decoded::Text`].

use std::collections::BTreeMap;

use serde_json::Value;

/// A decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A JSON object or array
    Json(Value),
    /// `key=value&...` pairs
    Form(BTreeMap<String, String>),
    /// Anything else, unchanged
    Text(String),
}

impl Decoded {
    /// Look up a top-level key and return it as text.
    ///
    /// JSON strings are returned as is; other JSON scalars are rendered.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self {
            Self::Json(Value::Object(map)) => map.get(key).and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            }),
            Self::Form(map) => map.get(key).cloned(),
            _ => None,
        }
    }

    /// Whether the body is a key/value mapping (JSON object or form pairs)
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Json(Value::Object(_)) | Self::Form(_))
    }

    /// The raw text, if the body could not be structured
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into a JSON value; form pairs become an object of strings
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(v) => v,
            Self::Form(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ),
            Self::Text(s) => Value::String(s),
        }
    }

    /// The `error` entry of a mapping, when present and not empty.
    ///
    /// Empty means null, `false`, `0`, `""`, `"0"`, or an empty array/object.
    /// Non-string values are rendered as JSON text.
    #[must_use]
    pub fn error_entry(&self) -> Option<String> {
        match self {
            Self::Json(Value::Object(map)) => {
                let value = map.get("error")?;
                if is_blank(value) {
                    return None;
                }
                Some(match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
            }
            Self::Form(map) => map
                .get("error")
                .filter(|s| !s.is_empty() && s.as_str() != "0")
                .cloned(),
            _ => None,
        }
    }
}

/// Decode a response body.
///
/// 1. A JSON object or array becomes [`Decoded::Json`].
/// 2. Otherwise, a body containing `=` is parsed as form pairs.
/// 3. Otherwise the body is returned unchanged as [`Decoded::Text`].
///
/// ```
/// use oauth_flow::decode::{decode, Decoded};
///
/// assert!(matches!(decode(r#"{"a":1}"#), Decoded::Json(_)));
/// assert_eq!(decode("a=1&b=2").get_str("b").as_deref(), Some("2"));
/// assert_eq!(decode("not json or kv"), Decoded::Text("not json or kv".into()));
/// ```
#[must_use]
pub fn decode(body: &str) -> Decoded {
    if let Ok(value @ (Value::Object(_) | Value::Array(_))) =
        serde_json::from_str::<Value>(body)
    {
        return Decoded::Json(value);
    }

    if body.contains('=') {
        let pairs = url::form_urlencoded::parse(body.trim().as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        return Decoded::Form(pairs);
    }

    Decoded::Text(body.to_string())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

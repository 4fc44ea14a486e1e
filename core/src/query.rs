//! Query-string construction.
//!
//! Values are kept as `serde_json::Value` until encoding so callers can pass
//! strings, numbers, booleans, lists, or `null` through one API:
//!
//! - `null` drops the parameter entirely;
//! - arrays expand to one `key=value` pair per non-null element;
//! - objects are sent as compact JSON text.

use serde_json::Value;

/// Ordered query parameters. Insertion order is preserved on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: Vec<(String, Value)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter (builder style).
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.params.push((key.into(), value.into()));
    }

    /// Append every parameter of `other` after this one's.
    pub fn extend(&mut self, other: &Query) {
        self.params.extend(other.params.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Percent-encoded `k=v&k=v` text, without a leading `?`.
    pub fn encode(&self) -> String {
        let mut pairs = Vec::new();
        for (key, value) in &self.params {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = scalar_text(item) {
                            pairs.push(encode_pair(key, &text));
                        }
                    }
                }
                other => {
                    if let Some(text) = scalar_text(other) {
                        pairs.push(encode_pair(key, &text));
                    }
                }
            }
        }
        pairs.join("&")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn encode_pair(key: &str, value: &str) -> String {
    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
}

//! Error bodies returned by the API.
//!
//! The server reports failures as `{"detail": ...}` where `detail` is
//! either a plain string or a list of field errors, each carrying a
//! `msg`.

use serde::Deserialize;
use serde_json::Value;

/// Error body of a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    /// Raw `detail` value.
    #[serde(default)]
    pub detail: Value,
}

impl ErrorBody {
    /// Parses an error body, returning `None` if it is not JSON or has no
    /// usable detail.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let body: Self = serde_json::from_slice(bytes).ok()?;
        if body.detail.is_null() {
            return None;
        }
        Some(body)
    }

    /// Human-readable message extracted from `detail`.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(s) => s.clone(),
            Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if msgs.is_empty() {
                    self.detail.to_string()
                } else {
                    msgs.join("; ")
                }
            }
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Extracts an error message from a response body, falling back to
/// `fallback` when the body carries no detail.
#[must_use]
pub fn error_message(bytes: &[u8], fallback: &str) -> String {
    ErrorBody::parse(bytes)
        .map(|body| body.message())
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

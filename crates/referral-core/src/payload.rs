//! Intake payload
//!
//! The browser assembles one flat JSON object per submission. Values arrive
//! as strings, booleans, short enumerations, string arrays (facility types)
//! and data URLs (signatures). Nothing here is persisted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// One submission's answers, keyed by form field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntakePayload(Map<String, Value>);

impl IntakePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only JSON objects
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(CoreError::InvalidPayload(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Parse a request body. An empty body is an empty payload.
    pub fn from_slice(body: &[u8]) -> Result<Self, CoreError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| CoreError::InvalidPayload(e.to_string()))?;
        Self::from_value(value)
    }

    /// Raw value; JSON `null` counts as absent
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Value rendered as text, empty when absent
    pub fn text(&self, key: &str) -> String {
        self.value(key).map(stringify).unwrap_or_default()
    }

    /// First non-empty text among `keys`
    pub fn text_any(&self, keys: &[&str]) -> String {
        keys.iter()
            .map(|k| self.text(k))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }

    /// Text of the first key that is present at all, even if empty
    pub fn text_first_present(&self, keys: &[&str]) -> String {
        keys.iter()
            .find_map(|k| self.value(k))
            .map(stringify)
            .unwrap_or_default()
    }

    /// Multi-select values. A scalar is treated as a one-element list.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.value(key) {
            Some(Value::Array(items)) => items.iter().map(stringify).collect(),
            Some(other) => vec![stringify(other)],
            None => vec![String::new()],
        }
    }

    pub fn is_blank(&self, key: &str) -> bool {
        self.text(key).trim().is_empty()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Set `key` only when it is missing or blank
    pub fn set_if_blank(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if self.is_blank(key) && !value.is_empty() {
            self.set(key, value);
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for IntakePayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Render a JSON value the way the form's string fields expect
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Strip characters that are invalid in file names and join words with `_`
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        "Referral_Form".to_string()
    } else {
        joined
    }
}

/// Download/attachment name for the merged referral packet
pub fn merged_file_name(payload: &IntakePayload) -> String {
    let name = payload.text("individual_name");
    let base = if name.trim().is_empty() {
        "Referral".to_string()
    } else {
        sanitize_file_name(&name)
    };
    format!("{}_Referral_Form.pdf", base)
}

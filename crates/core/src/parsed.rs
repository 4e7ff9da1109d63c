//! The structured-or-absent result of parsing generator output.
//!
//! Callers must branch on [`ParsedResult::Absent`] explicitly; there is no
//! "partially valid" state.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Reserved top-level field that marks a tool request from the model.
pub const TOOL_FIELD: &str = "tool";

/// Field carrying the tool arguments next to [`TOOL_FIELD`].
pub const ARGS_FIELD: &str = "args";

/// Structured model output: exactly one of object, array, or absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParsedResult {
    Object(Map<String, Value>),
    Array(Vec<Value>),
    #[default]
    Absent,
}

impl ParsedResult {
    /// Wrap a parsed JSON value. Scalars (strings, numbers, booleans, null)
    /// are not structured output and become `Absent`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Object(map),
            Value::Array(items) => Self::Array(items),
            _ => Self::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a top-level field of an object result.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Whether this result asks for a tool (an object with a string `"tool"` field).
    pub fn is_tool_request(&self) -> bool {
        self.get(TOOL_FIELD).is_some_and(Value::is_string)
    }

    /// Convert back to a JSON value. `Absent` becomes `None`.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Object(map) => Some(Value::Object(map)),
            Self::Array(items) => Some(Value::Array(items)),
            Self::Absent => None,
        }
    }

    /// Use `fallback` when the result is absent.
    pub fn or_else_value(self, fallback: impl FnOnce() -> Value) -> Value {
        self.into_value().unwrap_or_else(fallback)
    }
}

impl Serialize for ParsedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Object(map) => map.serialize(serializer),
            Self::Array(items) => items.serialize(serializer),
            Self::Absent => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_are_absent() {
        assert!(ParsedResult::from_value(json!(42)).is_absent());
        assert!(ParsedResult::from_value(json!("text")).is_absent());
        assert!(ParsedResult::from_value(Value::Null).is_absent());
    }

    #[test]
    fn object_field_lookup() {
        let parsed = ParsedResult::from_value(json!({"response": "hi"}));
        assert_eq!(parsed.get("response"), Some(&json!("hi")));
        assert!(!parsed.is_tool_request());
    }

    #[test]
    fn tool_request_requires_string_name() {
        let parsed = ParsedResult::from_value(json!({"tool": "calculate_bmi", "args": {}}));
        assert!(parsed.is_tool_request());
        let parsed = ParsedResult::from_value(json!({"tool": 7}));
        assert!(!parsed.is_tool_request());
        let parsed = ParsedResult::from_value(json!([{"tool": "calculate_bmi"}]));
        assert!(!parsed.is_tool_request());
    }

    #[test]
    fn serializes_as_plain_json() {
        let parsed = ParsedResult::from_value(json!({"a": [1, 2]}));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"a":[1,2]}"#);
        assert_eq!(serde_json::to_string(&ParsedResult::Absent).unwrap(), "null");
    }

    #[test]
    fn fallback_only_used_when_absent() {
        let value = ParsedResult::Absent.or_else_value(|| json!({"response": "fallback"}));
        assert_eq!(value["response"], "fallback");
        let value = ParsedResult::from_value(json!([1])).or_else_value(|| json!(null));
        assert_eq!(value, json!([1]));
    }
}

//! Argument binding shared by the numeric tools.

use serde_json::{Map, Value};
use vitalis_core::error::ToolError;

/// Read an optional numeric argument. Models emit numbers both as JSON
/// numbers and as numeric strings (`"70"`, `" 1.75 "`); both are accepted.
pub(crate) fn optional_number(args: &Map<String, Value>, name: &str) -> Result<Option<f64>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{name}' is not a finite number"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{name}' is not a number: {s:?}"))),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "'{name}' must be a number, got {other}"
        ))),
    }
}

/// Read a required numeric argument that must be strictly positive.
pub(crate) fn positive_number(args: &Map<String, Value>, name: &str) -> Result<f64, ToolError> {
    let value = optional_number(args, name)?
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing '{name}'")))?;
    ensure_positive(name, value)
}

pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<f64, ToolError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ToolError::InvalidArguments(format!("'{name}' must be positive, got {value}")))
    }
}

/// Read an optional string argument, trimmed and lowercased.
pub(crate) fn optional_text(args: &Map<String, Value>, name: &str) -> Option<String> {
    args.get(name)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

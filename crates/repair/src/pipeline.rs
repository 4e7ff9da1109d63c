//! The full repair-then-parse pipeline.
//!
//! ```text
//! raw text → extract → lazy keys → strip comments → stray tokens → parse
//!                                                                 │ fail
//!                                                                 ▼
//!                                                        balance → parse
//! ```
//!
//! A second failure yields [`ParsedResult::Absent`]; nothing here returns an
//! error.

use serde_json::Value;
use tracing::{debug, warn};
use vitalis_core::ParsedResult;

use crate::{
    balance_truncated, extract_structured, fix_stray_tokens, repair_lazy_keys,
    strip_line_comments,
};

/// Which pass produced the parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    /// The cleaned text parsed on the first attempt.
    Direct,
    /// Parsing succeeded only after auto-balancing.
    Balanced,
    /// Both attempts failed, or the value was a bare scalar.
    Failed,
}

/// Run every cleanup step that precedes the first parse attempt.
pub fn prepare(text: &str) -> String {
    let extracted = extract_structured(text.trim());
    let keyed = repair_lazy_keys(extracted);
    let uncommented = strip_line_comments(&keyed);
    fix_stray_tokens(&uncommented)
}

/// Parse model output into a structured value, repairing it as needed.
pub fn parse_structured(text: &str) -> ParsedResult {
    parse_with_stage(text).0
}

/// [`parse_structured`], also reporting which pass succeeded.
pub fn parse_with_stage(text: &str) -> (ParsedResult, ParseStage) {
    let cleaned = prepare(text);

    let first_error = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => return classify(value, ParseStage::Direct),
        Err(e) => e,
    };

    warn!(error = %first_error, "Structured output did not parse, attempting auto-balance");
    let balanced = balance_truncated(&cleaned);
    match serde_json::from_str::<Value>(&balanced) {
        Ok(value) => classify(value, ParseStage::Balanced),
        Err(e) => {
            debug!(error = %e, "Auto-balance failed");
            (ParsedResult::Absent, ParseStage::Failed)
        }
    }
}

fn classify(value: Value, stage: ParseStage) -> (ParsedResult, ParseStage) {
    let parsed = ParsedResult::from_value(value);
    if parsed.is_absent() {
        (parsed, ParseStage::Failed)
    } else {
        (parsed, stage)
    }
}

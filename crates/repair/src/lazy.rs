//! Key insertion for bare string values.
//!
//! Models sometimes emit `"day": "Mon", "Salmon",` inside a meal plan or
//! `, "Increase intake"}` at the end of a recommendation, dropping the key
//! they were told to use. The two rewrites below put `"title"` and `"desc"`
//! back in those positions.

use regex_lite::Regex;
use std::sync::LazyLock;
use tracing::trace;

static MISSING_TITLE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"("day":\s*"[^"]+",\s*)("[^"]+")(\s*,)"#).ok());

static MISSING_DESC: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(,\s*)("[^"]+")(\s*\})"#).ok());

/// Insert `"title"` after a `"day"` entry and `"desc"` before a closing brace
/// wherever a bare string stands where a key-value pair belongs.
pub fn repair_lazy_keys(text: &str) -> String {
    let mut repaired = text.to_string();
    if let Some(re) = MISSING_TITLE.as_ref() {
        repaired = re.replace_all(&repaired, r#"${1}"title": ${2}${3}"#).into_owned();
    }
    if let Some(re) = MISSING_DESC.as_ref() {
        repaired = re.replace_all(&repaired, r#"${1}"desc": ${2}${3}"#).into_owned();
    }
    if repaired != text {
        trace!("Inserted missing keys into structured output");
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_title_after_day() {
        let text = r#"{"day": "Mon", "Salmon", "benefit": "Omega3"}"#;
        assert_eq!(
            repair_lazy_keys(text),
            r#"{"day": "Mon", "title": "Salmon", "benefit": "Omega3"}"#
        );
    }

    #[test]
    fn inserts_desc_before_brace() {
        let text = r#"{"name": "Vit D", "Optimize levels"}"#;
        assert_eq!(
            repair_lazy_keys(text),
            r#"{"name": "Vit D", "desc": "Optimize levels"}"#
        );
    }

    #[test]
    fn well_formed_text_is_untouched() {
        let text = r#"{"day": "Mon", "title": "Salmon", "items": ["a", "b"], "n": 1}"#;
        assert_eq!(repair_lazy_keys(text), text);
    }

    #[test]
    fn fixes_every_occurrence() {
        let text = r#"[{"a": 1, "x"}, {"b": 2, "y"}]"#;
        assert_eq!(
            repair_lazy_keys(text),
            r#"[{"a": 1, "desc": "x"}, {"b": 2, "desc": "y"}]"#
        );
    }
}

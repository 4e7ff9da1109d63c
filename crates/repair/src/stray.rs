//! Removal of stray punctuation outside string literals.

use crate::scan::{StringTracker, next_significant};

/// Drop trailing commas before `}` or `]`, and a rogue quote wedged between
/// `]` and `}` (`["item"]"}` becomes `["item"]}`).
///
/// Only structural positions are touched; string contents pass through.
pub fn fix_stray_tokens(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut tracker = StringTracker::default();
    let mut segment_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if !tracker.in_string() {
            match b {
                b',' if matches!(next_significant(bytes, i + 1), Some((_, b'}' | b']'))) => {
                    out.push_str(&text[segment_start..i]);
                    segment_start = i + 1;
                    i += 1;
                    continue;
                }
                b']' => {
                    if let Some((quote, b'"')) = next_significant(bytes, i + 1)
                        && matches!(next_significant(bytes, quote + 1), Some((_, b'}')))
                    {
                        out.push_str(&text[segment_start..quote]);
                        segment_start = quote + 1;
                        i = quote + 1;
                        continue;
                    }
                }
                _ => {}
            }
        }
        tracker.feed(b);
        i += 1;
    }

    out.push_str(&text[segment_start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_comma_in_object() {
        assert_eq!(fix_stray_tokens(r#"{"key": "value",}"#), r#"{"key": "value"}"#);
    }

    #[test]
    fn trailing_comma_in_array_with_whitespace() {
        assert_eq!(fix_stray_tokens("[1, 2, \n]"), "[1, 2 \n]");
    }

    #[test]
    fn rogue_quote_after_array() {
        assert_eq!(fix_stray_tokens(r#"{"list": ["item"]"}"#), r#"{"list": ["item"]}"#);
    }

    #[test]
    fn string_contents_are_untouched() {
        let text = r#"{"a": "x,}", "b": "]\"}"}"#;
        assert_eq!(fix_stray_tokens(text), text);
    }

    #[test]
    fn valid_json_is_untouched() {
        let text = r#"{"a": [1, 2], "b": {"c": [3]}}"#;
        assert_eq!(fix_stray_tokens(text), text);
    }
}

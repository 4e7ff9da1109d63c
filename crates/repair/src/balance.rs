//! Auto-balancer — close structures cut off by the token limit.

use crate::scan::{StringTracker, prev_significant};

fn closer_for(opener: u8) -> char {
    if opener == b'{' { '}' } else { ']' }
}

/// Complete a truncated structured text so that it has a chance to parse.
///
/// In order: drops a trailing comma, closes an open string (discarding a
/// dangling backslash), gives a dangling `:` a `null` value, gives a key
/// left without a value a `: null`, then closes every open bracket
/// innermost first. Well-formed input passes through unchanged.
pub fn balance_truncated(text: &str) -> String {
    let mut s = text.trim().to_string();

    if s.ends_with(',') {
        s.pop();
        s.truncate(s.trim_end().len());
    }

    let mut tracker = StringTracker::default();
    for b in s.bytes() {
        tracker.feed(b);
    }
    if tracker.in_string() {
        if tracker.escape_pending() {
            s.pop();
        }
        s.push('"');
    }

    if s.ends_with(':') {
        s.push_str(" null");
    }

    let bytes = s.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut tracker = StringTracker::default();
    let mut last_string_start = None;
    for (i, &b) in bytes.iter().enumerate() {
        let was_in_string = tracker.in_string();
        if tracker.feed(b) {
            if !was_in_string {
                last_string_start = Some(i);
            }
            continue;
        }
        match b {
            b'{' | b'[' => stack.push(b),
            b'}' if stack.last() == Some(&b'{') => {
                stack.pop();
            }
            b']' if stack.last() == Some(&b'[') => {
                stack.pop();
            }
            _ => {}
        }
    }

    if stack.last() == Some(&b'{') && s.ends_with('"') {
        let dangling_key = last_string_start
            .and_then(|start| prev_significant(bytes, start))
            .is_some_and(|(_, b)| b == b'{' || b == b',');
        if dangling_key {
            s.push_str(": null");
        }
    }

    for &opener in stack.iter().rev() {
        s.push(closer_for(opener));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn balanced(text: &str) -> Value {
        serde_json::from_str(&balance_truncated(text)).unwrap()
    }

    #[test]
    fn closes_object_inside_array() {
        assert_eq!(balance_truncated(r#"[{"name": "test""#), r#"[{"name": "test"}]"#);
    }

    #[test]
    fn closes_array_inside_object() {
        assert_eq!(balance_truncated(r#"{"data": [1, 2"#), r#"{"data": [1, 2]}"#);
    }

    #[test]
    fn closes_open_string() {
        assert_eq!(balance_truncated(r#"{"key": "val"#), r#"{"key": "val"}"#);
    }

    #[test]
    fn closes_open_string_in_array() {
        assert_eq!(balance_truncated(r#"{"arr": ["a", "b"#), r#"{"arr": ["a", "b"]}"#);
    }

    #[test]
    fn drops_trailing_comma() {
        assert_eq!(balanced(r#"{"a": 1, "b": [true, "#), json!({"a": 1, "b": [true]}));
    }

    #[test]
    fn dangling_colon_gets_null() {
        assert_eq!(balanced(r#"{"a": 1, "b":"#), json!({"a": 1, "b": null}));
    }

    #[test]
    fn dangling_key_gets_null() {
        assert_eq!(balanced(r#"{"a": 1, "b""#), json!({"a": 1, "b": null}));
        assert_eq!(balanced(r#"{"outer": {"inner""#), json!({"outer": {"inner": null}}));
    }

    #[test]
    fn dangling_backslash_is_dropped() {
        assert_eq!(balanced(r#"{"path": "C:\"#), json!({"path": "C:"}));
    }

    #[test]
    fn value_string_is_not_treated_as_key() {
        assert_eq!(balance_truncated(r#"{"a": "b""#), r#"{"a": "b"}"#);
    }

    #[test]
    fn brackets_in_strings_do_not_count() {
        assert_eq!(balanced(r#"{"s": "{[", "t": 1"#), json!({"s": "{[", "t": 1}));
    }

    #[test]
    fn balanced_input_is_unchanged() {
        let text = r#"{"a": [1, {"b": "c"}]}"#;
        assert_eq!(balance_truncated(text), text);
    }
}

//! Sanitizer — isolate the first balanced structured block in mixed text.

use crate::scan::StringTracker;

fn opener_for(closer: u8) -> u8 {
    if closer == b'}' { b'{' } else { b'[' }
}

/// Return the span from the first `{` or `[` through its matching closer.
///
/// Brackets inside string literals are ignored and mismatched closers are
/// skipped. Text without an opening bracket is returned unchanged; an
/// unbalanced block runs to the end of the input.
pub fn extract_structured(text: &str) -> &str {
    let Some(start) = text.find(['{', '[']) else {
        return text;
    };

    let bytes = text.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut tracker = StringTracker::default();

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if tracker.feed(b) {
            continue;
        }
        match b {
            b'{' | b'[' => stack.push(b),
            b'}' | b']' => {
                if stack.last() == Some(&opener_for(b)) {
                    stack.pop();
                }
                if stack.is_empty() {
                    return &text[start..=i];
                }
            }
            _ => {}
        }
    }

    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_surrounding_prose() {
        assert_eq!(extract_structured(r#"noise {"a":1} noise"#), r#"{"a":1}"#);
    }

    #[test]
    fn strips_code_fences() {
        let text = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_structured(text), r#"{"key": "value"}"#);
    }

    #[test]
    fn arrays_are_extracted() {
        assert_eq!(extract_structured("Result: [1, [2, 3]] done"), "[1, [2, 3]]");
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        let text = r#"{"note": "use } and ] freely", "q": "say \"}\""} tail"#;
        assert_eq!(
            extract_structured(text),
            r#"{"note": "use } and ] freely", "q": "say \"}\""}"#
        );
    }

    #[test]
    fn stops_at_first_block() {
        assert_eq!(extract_structured(r#"{"a":1} {"b":2}"#), r#"{"a":1}"#);
    }

    #[test]
    fn no_bracket_returns_input() {
        assert_eq!(extract_structured("plain prose"), "plain prose");
    }

    #[test]
    fn unbalanced_runs_to_end() {
        assert_eq!(extract_structured(r#"Sure: {"arr": ["a", "b"#), r#"{"arr": ["a", "b"#);
    }

    #[test]
    fn mismatched_closer_is_skipped() {
        assert_eq!(extract_structured(r#"{"a": 1]}"#), r#"{"a": 1]}"#);
    }

    #[test]
    fn multibyte_text_around_block() {
        assert_eq!(extract_structured(r#"✅ Voilà {"café": "crème"} ✔"#), r#"{"café": "crème"}"#);
    }
}

//! Removal of `//` line comments that models leave inside JSON.

use crate::scan::StringTracker;

/// Drop every `//` comment that starts outside a string literal.
///
/// The comment runs up to, but not including, the next newline. A `//`
/// inside a string (a URL, say) is left alone.
pub fn strip_line_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut tracker = StringTracker::default();
    let mut segment_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if !tracker.in_string() && b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            out.push_str(&text[segment_start..i]);
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            segment_start = i;
            continue;
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
    fn removes_trailing_comment() {
        let text = "{\n  \"a\": 1, // the answer\n  \"b\": 2\n}";
        assert_eq!(strip_line_comments(text), "{\n  \"a\": 1, \n  \"b\": 2\n}");
    }

    #[test]
    fn comment_at_end_of_input() {
        assert_eq!(strip_line_comments(r#"{"a": 1} // done"#), r#"{"a": 1} "#);
    }

    #[test]
    fn urls_survive() {
        let text = r#"{"url": "https://example.com/path"}"#;
        assert_eq!(strip_line_comments(text), text);
    }

    #[test]
    fn slashes_inside_strings_survive() {
        let text = r#"{"note": "not // a comment", "x": "a\"//b"}"#;
        assert_eq!(strip_line_comments(text), text);
    }

    #[test]
    fn single_slash_is_kept() {
        assert_eq!(strip_line_comments(r#"{"ratio": "1/2"} /"#), r#"{"ratio": "1/2"} /"#);
    }
}

//! Shared string-literal tracking for the byte scanners.

/// Tracks whether a left-to-right scan is inside a JSON string literal.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StringTracker {
    in_string: bool,
    escaped: bool,
}

impl StringTracker {
    /// Feed one byte. Returns `true` when the byte belongs to a string
    /// literal, delimiting quotes included.
    pub(crate) fn feed(&mut self, b: u8) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if b == b'\\' {
                self.escaped = true;
            } else if b == b'"' {
                self.in_string = false;
            }
            return true;
        }
        if b == b'"' {
            self.in_string = true;
            return true;
        }
        false
    }

    pub(crate) fn in_string(&self) -> bool {
        self.in_string
    }

    /// A backslash was the last byte and has not consumed its escapee yet.
    pub(crate) fn escape_pending(&self) -> bool {
        self.escaped
    }
}

/// Index and value of the next non-whitespace byte at or after `from`.
pub(crate) fn next_significant(bytes: &[u8], from: usize) -> Option<(usize, u8)> {
    bytes
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, b)| !b.is_ascii_whitespace())
        .map(|(i, b)| (i, *b))
}

/// Index and value of the last non-whitespace byte before `end`.
pub(crate) fn prev_significant(bytes: &[u8], end: usize) -> Option<(usize, u8)> {
    bytes[..end]
        .iter()
        .enumerate()
        .rev()
        .find(|(_, b)| !b.is_ascii_whitespace())
        .map(|(i, b)| (i, *b))
}

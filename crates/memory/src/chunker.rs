//! Paragraph chunking for plain-text documents.

use vitalis_core::IngestedDocument;

/// Split `text` on blank lines and keep trimmed paragraphs longer than
/// `min_chars` characters.
pub fn chunk_paragraphs(text: &str, min_chars: usize) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| p.chars().count() > min_chars)
        .map(String::from)
        .collect()
}

/// Build an [`IngestedDocument`] from plain text.
pub fn ingest_text(text: impl Into<String>, min_chars: usize) -> IngestedDocument {
    let full_text = text.into();
    let chunks = chunk_paragraphs(&full_text, min_chars);
    IngestedDocument::new(full_text, chunks)
}

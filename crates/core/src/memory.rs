//! Retrieval corpus types.
//!
//! A document arrives from the ingestion collaborator as full text plus a
//! list of chunks. Once its chunks are embedded it becomes a
//! [`ChunkedDocument`]: chunks and vectors paired index-for-index.

use serde::{Deserialize, Serialize};
use crate::error::MemoryError;

/// Output of the document ingestion collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestedDocument {
    /// The complete extracted text.
    pub full_text: String,

    /// Logical chunks for retrieval indexing.
    pub chunks: Vec<String>,
}

impl IngestedDocument {
    pub fn new(full_text: impl Into<String>, chunks: Vec<String>) -> Self {
        Self {
            full_text: full_text.into(),
            chunks,
        }
    }
}

/// Chunks paired with their embedding vectors.
///
/// `chunks.len() == vectors.len()` always holds. An empty vector means no
/// embedding was available for that chunk; it ranks with similarity 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCorpus")]
pub struct ChunkedDocument {
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct RawCorpus {
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl TryFrom<RawCorpus> for ChunkedDocument {
    type Error = MemoryError;

    fn try_from(raw: RawCorpus) -> Result<Self, Self::Error> {
        Self::new(raw.chunks, raw.vectors)
    }
}

impl ChunkedDocument {
    /// Pair chunks with vectors, rejecting length mismatches.
    pub fn new(chunks: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Self, MemoryError> {
        if chunks.len() != vectors.len() {
            return Err(MemoryError::CorpusMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }
        Ok(Self { chunks, vectors })
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate `(chunk, vector)` pairs in original order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.chunks
            .iter()
            .zip(self.vectors.iter())
            .map(|(c, v)| (c.as_str(), v.as_slice()))
    }

    /// Number of chunks that actually have an embedding.
    pub fn embedded_count(&self) -> usize {
        self.vectors.iter().filter(|v| !v.is_empty()).count()
    }
}

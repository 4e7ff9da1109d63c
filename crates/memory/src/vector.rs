//! Vector similarity and chunk ranking.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - Stable top-k ranking of corpus chunks against a query embedding

use vitalis_core::ChunkedDocument;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is empty, the lengths differ, or either
/// magnitude is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// A chunk together with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedChunk<'a> {
    pub index: usize,
    pub text: &'a str,
    pub score: f32,
}

/// Rank every chunk of `corpus` by cosine similarity to `query`.
///
/// Sorted by descending score; the sort is stable, so equal scores keep
/// their corpus order. At most `top_k` chunks are returned.
pub fn rank_chunks<'a>(
    corpus: &'a ChunkedDocument,
    query: &[f32],
    top_k: usize,
) -> Vec<RankedChunk<'a>> {
    let mut scored: Vec<RankedChunk<'a>> = corpus
        .iter()
        .enumerate()
        .map(|(index, (text, vector))| RankedChunk {
            index,
            text,
            score: cosine_similarity(query, vector),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}

//! Retrieval-augmented context: index a document's chunks, then pull the
//! chunks most similar to a query.

use tracing::{debug, info};
use vitalis_config::RetrievalConfig;
use vitalis_core::ChunkedDocument;
use vitalis_core::error::MemoryError;

use crate::embedding::EmbeddingClient;
use crate::vector::rank_chunks;

pub struct Retriever {
    embedder: EmbeddingClient,
    top_k: usize,
    separator: String,
    max_indexed_chunks: usize,
}

impl Retriever {
    pub fn new(embedder: EmbeddingClient, config: &RetrievalConfig) -> Self {
        Self {
            embedder,
            top_k: config.top_k,
            separator: config.separator.clone(),
            max_indexed_chunks: config.max_indexed_chunks,
        }
    }

    pub fn embedder(&self) -> &EmbeddingClient {
        &self.embedder
    }

    /// Embed the first `max_indexed_chunks` chunks into a corpus.
    ///
    /// Chunks that fail to embed keep an empty vector and never rank above
    /// an embedded chunk.
    pub async fn index_chunks(&self, chunks: &[String]) -> Result<ChunkedDocument, MemoryError> {
        let kept = &chunks[..chunks.len().min(self.max_indexed_chunks)];
        let mut vectors = Vec::with_capacity(kept.len());
        for chunk in kept {
            vectors.push(self.embedder.embed(chunk).await);
        }

        let corpus = ChunkedDocument::new(kept.to_vec(), vectors)?;
        info!(
            chunks = corpus.len(),
            embedded = corpus.embedded_count(),
            dropped = chunks.len() - kept.len(),
            "Indexed document"
        );
        Ok(corpus)
    }

    /// The `top_k` chunks most similar to `query`, joined by the separator.
    ///
    /// Empty when the corpus is empty or the query cannot be embedded.
    pub async fn retrieve_context(&self, corpus: &ChunkedDocument, query: &str) -> String {
        if corpus.is_empty() {
            return String::new();
        }
        let query_vector = self.embedder.embed(query).await;
        if query_vector.is_empty() {
            debug!("Query could not be embedded, no context retrieved");
            return String::new();
        }

        rank_chunks(corpus, &query_vector, self.top_k)
            .iter()
            .map(|ranked| ranked.text)
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

//! Retrieval memory for Vitalis: embeddings, similarity ranking, context
//! retrieval, document chunking, and the in-memory session store.

pub mod chunker;
pub mod embedding;
pub mod retriever;
pub mod session;
pub mod vector;

pub use chunker::{chunk_paragraphs, ingest_text};
pub use embedding::{EmbeddingCache, EmbeddingClient};
pub use retriever::Retriever;
pub use session::InMemorySessionStore;
pub use vector::{RankedChunk, cosine_similarity, rank_chunks};

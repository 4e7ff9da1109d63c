//! Embedding client with a content-addressed cache.
//!
//! Embeddings are requested one text at a time. Identical text is embedded
//! once per process: the cache is keyed by the SHA-256 digest of the text
//! and never evicts.

use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use vitalis_core::{EmbeddingRequest, Provider};

/// Shared, append-only map from text digest to embedding vector.
#[derive(Clone, Default)]
pub struct EmbeddingCache {
    entries: Arc<RwLock<HashMap<String, Vec<f32>>>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hex SHA-256 of `text`, the cache key.
    pub fn key_for(text: &str) -> String {
        hex::encode(Sha256::digest(text.as_bytes()))
    }

    pub async fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.entries.read().await.get(&Self::key_for(text)).cloned()
    }

    pub async fn insert(&self, text: &str, vector: Vec<f32>) {
        self.entries.write().await.insert(Self::key_for(text), vector);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Turns text into vectors through the provider, consulting the cache first.
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn Provider>,
    model: String,
    cache: EmbeddingCache,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, cache: EmbeddingCache) -> Self {
        Self {
            provider,
            model: model.into(),
            cache,
        }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Embed `text`.
    ///
    /// Never fails: empty text, a provider error, or an empty vector from
    /// the backend all yield an empty vector, which ranks with similarity 0.
    /// Only non-empty vectors are cached.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if text.is_empty() {
            return Vec::new();
        }
        if let Some(hit) = self.cache.get(text).await {
            return hit;
        }

        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };
        match self.provider.embed(request).await {
            Ok(response) if !response.embedding.is_empty() => {
                debug!(model = %self.model, dims = response.embedding.len(), "Embedded text");
                self.cache.insert(text, response.embedding.clone()).await;
                response.embedding
            }
            Ok(_) => {
                warn!(model = %self.model, "Embedding backend returned an empty vector");
                Vec::new()
            }
            Err(e) => {
                warn!(model = %self.model, error = %e, "Embedding request failed");
                Vec::new()
            }
        }
    }
}

//! In-memory session store — per-caller records held for the life of the process.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use vitalis_core::error::MemoryError;
use vitalis_core::{ChatTurn, ChunkedDocument, SessionRecord, SessionStore};

#[derive(Default)]
struct Sessions {
    records: HashMap<String, SessionRecord>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
}

/// A bounded in-memory [`SessionStore`].
///
/// Once `capacity` sessions exist, creating another evicts the oldest
/// session by insertion order.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<Sessions>>,
    capacity: usize,
}

impl InMemorySessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(Sessions::default())),
            capacity: capacity.max(1),
        }
    }

    /// Run `f` on the record for `key`, creating the record first if needed.
    async fn with_record<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut SessionRecord) -> T,
    ) -> Result<T, MemoryError> {
        if key.is_empty() {
            return Err(MemoryError::MissingSessionKey);
        }

        let mut sessions = self.sessions.write().await;
        if !sessions.records.contains_key(key) {
            while sessions.records.len() >= self.capacity {
                let Some(oldest) = sessions.order.pop_front() else {
                    break;
                };
                sessions.records.remove(&oldest);
                debug!(session = %oldest, "Evicted oldest session");
            }
            sessions.order.push_back(key.to_string());
            sessions.records.insert(key.to_string(), SessionRecord::default());
        }

        let record = sessions
            .records
            .get_mut(key)
            .ok_or_else(|| MemoryError::Storage(format!("session {key} vanished")))?;
        Ok(f(record))
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn snapshot(&self, key: &str) -> Result<SessionRecord, MemoryError> {
        self.with_record(key, |record| record.clone()).await
    }

    async fn set_corpus(&self, key: &str, corpus: ChunkedDocument) -> Result<(), MemoryError> {
        self.with_record(key, |record| record.corpus = corpus).await
    }

    async fn set_last_context(&self, key: &str, context: String) -> Result<(), MemoryError> {
        self.with_record(key, |record| record.last_context = context).await
    }

    async fn set_analysis(&self, key: &str, analysis: Value) -> Result<(), MemoryError> {
        self.with_record(key, |record| record.analysis = Some(analysis)).await
    }

    async fn append_turns(&self, key: &str, turns: Vec<ChatTurn>) -> Result<(), MemoryError> {
        self.with_record(key, |record| record.chat_history.extend(turns)).await
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.sessions.read().await.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn new_key_gets_empty_record() {
        let store = InMemorySessionStore::default();
        let record = store.snapshot("alice").await.unwrap();
        assert!(record.chat_history.is_empty());
        assert!(record.corpus.is_empty());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_key_is_rejected() {
        let store = InMemorySessionStore::default();
        let err = store.snapshot("").await.unwrap_err();
        assert!(matches!(err, MemoryError::MissingSessionKey));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn updates_are_visible_in_snapshots() {
        let store = InMemorySessionStore::default();
        store.set_analysis("bob", json!({"summary": "Low iron"})).await.unwrap();
        store.set_last_context("bob", "ctx".into()).await.unwrap();
        store
            .append_turns("bob", vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")])
            .await
            .unwrap();

        let record = store.snapshot("bob").await.unwrap();
        assert_eq!(record.summary(), Some("Low iron"));
        assert_eq!(record.last_context, "ctx");
        assert_eq!(record.chat_history.len(), 2);
    }

    #[tokio::test]
    async fn oldest_session_is_evicted_at_capacity() {
        let store = InMemorySessionStore::new(2);
        store.snapshot("a").await.unwrap();
        store.snapshot("b").await.unwrap();
        store.set_last_context("a", "still here".into()).await.unwrap();
        store.snapshot("c").await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        // "a" was inserted first; touching it does not refresh its position.
        assert_eq!(store.snapshot("a").await.unwrap().last_context, "");
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemorySessionStore::default();
        store.set_last_context("x", "one".into()).await.unwrap();
        store.set_last_context("y", "two".into()).await.unwrap();
        assert_eq!(store.snapshot("x").await.unwrap().last_context, "one");
        assert_eq!(store.snapshot("y").await.unwrap().last_context, "two");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_to_one_session_are_all_kept() {
        let store = Arc::new(InMemorySessionStore::default());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .append_turns("shared", vec![ChatTurn::user(format!("msg {i}"))])
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let record = store.snapshot("shared").await.unwrap();
        assert_eq!(record.chat_history.len(), 32);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}

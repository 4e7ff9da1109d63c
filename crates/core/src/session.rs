//! Session store trait — the per-caller mutable record.
//!
//! The core reads and appends to a handful of named fields; persistence,
//! eviction, and storage format belong to the implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::error::MemoryError;
use crate::memory::ChunkedDocument;

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry of a session's chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// A snapshot of one caller's session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Prior chat turns, oldest first.
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,

    /// Last indexed retrieval corpus.
    #[serde(default)]
    pub corpus: ChunkedDocument,

    /// Context string computed for the most recent query.
    #[serde(default)]
    pub last_context: String,

    /// Last structured document analysis, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
}

impl SessionRecord {
    /// The `"summary"` field of the stored analysis, if there is one.
    pub fn summary(&self) -> Option<&str> {
        self.analysis.as_ref()?.get("summary")?.as_str()
    }
}

/// A concurrency-safe keyed store of session records.
///
/// Every method takes the caller key; empty keys are rejected with
/// [`MemoryError::MissingSessionKey`]. Unknown keys are created on first use.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Name of the backend, for logs.
    fn name(&self) -> &str;

    /// Clone the current record for `key`, creating it if needed.
    async fn snapshot(&self, key: &str) -> Result<SessionRecord, MemoryError>;

    /// Replace the retrieval corpus.
    async fn set_corpus(&self, key: &str, corpus: ChunkedDocument) -> Result<(), MemoryError>;

    /// Record the context computed for the latest query.
    async fn set_last_context(&self, key: &str, context: String) -> Result<(), MemoryError>;

    /// Store the latest structured document analysis.
    async fn set_analysis(&self, key: &str, analysis: Value) -> Result<(), MemoryError>;

    /// Append turns to the chat history.
    async fn append_turns(&self, key: &str, turns: Vec<ChatTurn>) -> Result<(), MemoryError>;

    /// Number of live sessions.
    async fn count(&self) -> Result<usize, MemoryError>;
}

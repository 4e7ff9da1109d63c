//! # Vitalis Core
//!
//! Domain types, traits, and error definitions for the Vitalis inference
//! reliability layer. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator (inference backend, tool, session store) is defined as a
//! trait here. Implementations live in their respective crates. This enables:
//! - Swapping the inference backend via configuration
//! - Easy testing with scripted/mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod memory;
pub mod message;
pub mod parsed;
pub mod provider;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use memory::{ChunkedDocument, IngestedDocument};
pub use message::{Message, Role};
pub use parsed::ParsedResult;
pub use provider::{
    ChunkReceiver, EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
    ResponseFormat, StreamChunk,
};
pub use session::{ChatTurn, SessionRecord, SessionStore, TurnRole};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};

//! Inference provider implementations for Vitalis.
//!
//! All providers implement the `vitalis_core::Provider` trait.

pub mod ollama;

pub use ollama::{OllamaProvider, normalize_base_url};

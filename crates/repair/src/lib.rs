//! Extraction and repair of structured output from model text.
//!
//! Generative models wrap JSON in prose and code fences, truncate it at the
//! token limit, sprinkle `//` comments into it, and occasionally forget a
//! key. Each repair step here targets one of those failure shapes; the
//! [`pipeline`] module chains them into a single repair-then-parse attempt.
//!
//! Every scanner in this crate works on bytes: the structural characters it
//! cares about (`{ } [ ] " \ , /`) are ASCII and never appear inside a
//! multi-byte UTF-8 sequence, so slicing at their positions is always valid.

pub mod balance;
pub mod comments;
pub mod extract;
pub mod lazy;
pub mod pipeline;
mod scan;
pub mod stray;

pub use balance::balance_truncated;
pub use comments::strip_line_comments;
pub use extract::extract_structured;
pub use lazy::repair_lazy_keys;
pub use pipeline::{ParseStage, parse_structured, parse_with_stage, prepare};
pub use stray::fix_stray_tokens;

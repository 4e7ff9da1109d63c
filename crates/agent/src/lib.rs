//! The reliability loop around the model.
//!
//! A request flows through four layers:
//!
//! 1. **Query** — [`InferenceClient`] sends a JSON-mode request, repairs the
//!    reply, and retries once with a corrective instruction if it is still
//!    unparseable
//! 2. **Act** — [`AgentLoop`] dispatches a requested tool and re-queries with
//!    its result, for a bounded number of rounds
//! 3. **Stream** — [`stream_reply`] forwards prose as it arrives but holds
//!    back anything that looks like a tool request
//! 4. **Remember** — [`Assistant`] grounds chat in the session's document
//!    analysis and retrieved evidence, and records the exchange

pub mod agent_loop;
pub mod assistant;
pub mod client;
pub mod stream;

pub use agent_loop::AgentLoop;
pub use assistant::Assistant;
pub use client::{InferenceClient, QueryRequest};
pub use stream::{ANALYSIS_PREFIX, STREAM_APOLOGY, StreamClassifier, StreamEnd, StreamState, stream_reply};

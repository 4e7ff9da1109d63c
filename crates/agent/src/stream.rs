//! Streaming replies with tool-call detection.
//!
//! A streamed reply is either prose for the user or a JSON tool request that
//! must never be shown raw. The [`StreamClassifier`] decides which from the
//! first few characters: a leading `{` or `` ` `` starts buffering, anything
//! else is released once the buffer grows past the threshold.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vitalis_core::{Provider, ProviderRequest, ToolCall, ToolRegistry};
use vitalis_repair::parse_structured;

/// Emitted in place of an error when the upstream stream fails.
pub const STREAM_APOLOGY: &str = "Sorry, I lost my connection to the model. Please try again.";

/// Prefix of the single chunk emitted for a resolved tool call.
pub const ANALYSIS_PREFIX: &str = "✅ Analysis: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Not enough text seen to decide.
    Undetermined,
    /// Looks structured; everything is held until the end.
    ToolBuffering,
    /// Prose; fragments are forwarded as they arrive.
    Passthrough,
}

/// What is left to do once the upstream is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// Nothing buffered.
    Empty,
    /// Undecided text to release as-is.
    Flush(String),
    /// A buffered structured reply to resolve.
    Resolve(String),
}

/// Classifies a token stream as prose or a structured tool request.
#[derive(Debug)]
pub struct StreamClassifier {
    state: StreamState,
    buffer: String,
    threshold: usize,
}

impl StreamClassifier {
    pub fn new(threshold: usize) -> Self {
        Self {
            state: StreamState::Undetermined,
            buffer: String::new(),
            threshold,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Feed one fragment. Returns the text to forward right now, if any.
    pub fn push(&mut self, fragment: &str) -> Option<String> {
        if fragment.is_empty() {
            return None;
        }
        match self.state {
            StreamState::Passthrough => Some(fragment.to_string()),
            StreamState::ToolBuffering => {
                self.buffer.push_str(fragment);
                None
            }
            StreamState::Undetermined => {
                self.buffer.push_str(fragment);
                match self.buffer.trim_start().chars().next() {
                    Some('{' | '`') => {
                        self.state = StreamState::ToolBuffering;
                        None
                    }
                    _ if self.buffer.chars().count() > self.threshold => {
                        self.state = StreamState::Passthrough;
                        Some(std::mem::take(&mut self.buffer))
                    }
                    _ => None,
                }
            }
        }
    }

    /// Drain whatever is still held.
    pub fn finish(&mut self) -> StreamEnd {
        let buffer = std::mem::take(&mut self.buffer);
        if buffer.is_empty() {
            return StreamEnd::Empty;
        }
        match self.state {
            StreamState::ToolBuffering => StreamEnd::Resolve(buffer),
            _ => StreamEnd::Flush(buffer),
        }
    }
}

/// Turn a buffered structured reply into user-facing text: a tool request is
/// dispatched and summarized, anything else is released verbatim.
pub async fn resolve_buffered(buffer: String, tools: &ToolRegistry) -> String {
    let parsed = parse_structured(&buffer);
    match ToolCall::from_parsed(&parsed) {
        Some(call) => {
            info!(tool = %call.name, "Tool request detected in stream");
            let result = tools.dispatch(&call).await;
            format!("{ANALYSIS_PREFIX}{result}")
        }
        None => buffer,
    }
}

/// Stream a reply for `request`, hiding tool requests behind their results.
///
/// The returned receiver yields user-visible text fragments. Dropping it
/// cancels the upstream read. Upstream failures end the stream with
/// [`STREAM_APOLOGY`].
pub fn stream_reply(
    provider: Arc<dyn Provider>,
    request: ProviderRequest,
    tools: Arc<ToolRegistry>,
    threshold: usize,
) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut upstream = match provider.stream(request).await {
            Ok(upstream) => upstream,
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Could not open stream");
                let _ = tx.send(STREAM_APOLOGY.to_string()).await;
                return;
            }
        };

        let mut classifier = StreamClassifier::new(threshold);
        while let Some(item) = upstream.recv().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Stream failed mid-reply");
                    let _ = tx.send(STREAM_APOLOGY.to_string()).await;
                    return;
                }
            };
            if let Some(text) = chunk.content.as_deref().and_then(|t| classifier.push(t))
                && tx.send(text).await.is_err()
            {
                debug!("Stream consumer went away");
                return;
            }
            if chunk.done {
                break;
            }
        }

        let tail = match classifier.finish() {
            StreamEnd::Empty => return,
            StreamEnd::Flush(text) => text,
            StreamEnd::Resolve(buffer) => resolve_buffered(buffer, &tools).await,
        };
        let _ = tx.send(tail).await;
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vitalis_core::error::ProviderError;
    use vitalis_core::{ChunkReceiver, ProviderResponse, StreamChunk};
    use vitalis_tools::default_registry;

    /// Streams fixed fragments, optionally failing after them.
    struct FragmentProvider {
        fragments: Vec<&'static str>,
        fail_after: bool,
    }

    #[async_trait]
    impl Provider for FragmentProvider {
        fn name(&self) -> &str {
            "fragments"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("stream only".into()))
        }

        async fn stream(&self, _request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
            let (tx, rx) = mpsc::channel(self.fragments.len() + 2);
            for fragment in &self.fragments {
                let _ = tx
                    .send(Ok(StreamChunk {
                        content: Some(fragment.to_string()),
                        done: false,
                    }))
                    .await;
            }
            let last = if self.fail_after {
                Err(ProviderError::StreamInterrupted("connection reset".into()))
            } else {
                Ok(StreamChunk {
                    content: None,
                    done: true,
                })
            };
            let _ = tx.send(last).await;
            Ok(rx)
        }
    }

    async fn collect(fragments: Vec<&'static str>, fail_after: bool) -> Vec<String> {
        let provider = Arc::new(FragmentProvider { fragments, fail_after });
        let mut rx = stream_reply(
            provider,
            ProviderRequest::new("m", vec![]).streaming(),
            Arc::new(default_registry()),
            10,
        );
        let mut out = Vec::new();
        while let Some(text) = rx.recv().await {
            out.push(text);
        }
        out
    }

    #[tokio::test]
    async fn prose_is_released_after_threshold() {
        let out = collect(vec!["Hello", " world", "."], false).await;
        assert_eq!(out, vec!["Hello world".to_string(), ".".to_string()]);
    }

    #[tokio::test]
    async fn tool_request_becomes_single_analysis_chunk() {
        let out = collect(
            vec!["{", r#""tool":"calculate_bmi","args":{"weight_kg":70,"height_m":1.75}}"#],
            false,
        )
        .await;
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("✅ Analysis:"));
        assert!(out[0].contains("BMI: 22.86"));
    }

    #[tokio::test]
    async fn brace_prose_is_released_verbatim() {
        let out = collect(vec!["{", "Subject}: Hi"], false).await;
        assert_eq!(out.concat(), "{Subject}: Hi");
    }

    #[tokio::test]
    async fn short_reply_is_flushed_at_end() {
        let out = collect(vec!["Ok."], false).await;
        assert_eq!(out, vec!["Ok.".to_string()]);
    }

    #[tokio::test]
    async fn failure_ends_with_apology() {
        let out = collect(vec!["Your iron levels look ", "fine, but"], true).await;
        assert_eq!(out.last().map(String::as_str), Some(STREAM_APOLOGY));
        assert_eq!(out[0], "Your iron levels look ");
    }

    #[tokio::test]
    async fn fenced_reply_is_buffered() {
        let out = collect(vec!["```json\n", r#"{"response": "hi"}"#, "\n```"], false).await;
        assert_eq!(out, vec!["```json\n{\"response\": \"hi\"}\n```".to_string()]);
    }

    #[test]
    fn classifier_transitions() {
        let mut classifier = StreamClassifier::new(4);
        assert_eq!(classifier.push("  "), None);
        assert_eq!(classifier.state(), StreamState::Undetermined);
        assert_eq!(classifier.push("{\"a\""), None);
        assert_eq!(classifier.state(), StreamState::ToolBuffering);
        assert_eq!(classifier.finish(), StreamEnd::Resolve("  {\"a\"".into()));
        assert_eq!(classifier.finish(), StreamEnd::Empty);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut classifier = StreamClassifier::new(5);
        assert_eq!(classifier.push("abcde"), None);
        assert_eq!(classifier.push("f"), Some("abcdef".into()));
        assert_eq!(classifier.state(), StreamState::Passthrough);
        assert_eq!(classifier.push(""), None);
    }
}

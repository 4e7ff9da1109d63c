//! Ollama provider implementation.
//!
//! Talks to the native Ollama HTTP API:
//! - `POST /api/chat` for completions (single JSON body, or NDJSON when streaming)
//! - `POST /api/embeddings` for one embedding per request
//! - `GET /api/tags` for model listing and health checks

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use vitalis_config::OllamaConfig;
use vitalis_core::error::ProviderError;
use vitalis_core::message::Message;
use vitalis_core::provider::*;

/// A provider backed by a local or remote Ollama server.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a provider for `base_url`. Every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: normalize_base_url(base_url),
            client,
        })
    }

    /// Create a provider from the `[ollama]` config section.
    pub fn from_config(config: &OllamaConfig) -> Result<Self, ProviderError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
                images: (!m.images.is_empty()).then(|| m.images.clone()),
            })
            .collect()
    }

    fn chat_body(request: &ProviderRequest, stream: bool) -> ChatRequest {
        ChatRequest {
            model: request.model.clone(),
            messages: Self::to_api_messages(&request.messages),
            stream,
            // Structured mode is only requested for complete replies; a
            // streamed reply may be prose.
            format: if stream {
                None
            } else {
                request.format.map(|_| "json".to_string())
            },
            options: ChatOptions {
                temperature: request.temperature,
                num_ctx: request.context_window,
            },
        }
    }

    async fn post_chat(
        &self,
        body: &ChatRequest,
    ) -> std::result::Result<reqwest::Response, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(ProviderError::ModelNotFound(body.model.clone()));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Ollama returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }
        Ok(response)
    }
}

/// Strip a trailing `/`, `/api/generate`, or `/api/chat` so that endpoint
/// paths can be appended.
pub fn normalize_base_url(url: &str) -> String {
    let mut base = url.trim().trim_end_matches('/');
    for suffix in ["/api/generate", "/api/chat"] {
        if let Some(stripped) = base.strip_suffix(suffix) {
            base = stripped.trim_end_matches('/');
        }
    }
    base.to_string()
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Accumulates raw stream bytes and yields complete lines.
///
/// Lines are decoded only once their terminating newline has arrived, so a
/// multibyte character split across network chunks is reassembled intact.
/// Lines that are not valid UTF-8 are dropped.
#[derive(Default)]
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// The next complete line, without its newline.
    fn next_line(&mut self) -> Option<String> {
        loop {
            let end = self.bytes.iter().position(|&b| b == b'\n')?;
            let line: Vec<u8> = self.bytes.drain(..=end).collect();
            if let Some(text) = decode_line(&line[..end]) {
                return Some(text);
            }
        }
    }

    /// Whatever is left after the stream ends.
    fn remainder(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.bytes);
        decode_line(&rest)
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(e) => {
            trace!(error = %e, "Ignoring stream line that is not UTF-8");
            None
        }
    }
}

/// Parse one NDJSON line of a streamed chat reply.
///
/// Returns `None` for blank or malformed lines; the caller skips them.
fn parse_stream_line(line: &str) -> Option<StreamChunk> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamLine>(line) {
        Ok(parsed) => Some(StreamChunk {
            content: parsed
                .message
                .map(|m| m.content)
                .filter(|c| !c.is_empty()),
            done: parsed.done,
        }),
        Err(e) => {
            trace!(line = %line, error = %e, "Ignoring unparseable stream line");
            None
        }
    }
}

#[async_trait]
impl vitalis_core::Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let body = Self::chat_body(&request, false);
        debug!(model = %request.model, messages = body.messages.len(), "Sending chat request");

        let response = self.post_chat(&body).await?;
        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(ProviderResponse {
            content: api_response.message.content,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        let body = Self::chat_body(&request, true);
        debug!(model = %request.model, "Sending streaming chat request");

        let response = self.post_chat(&body).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(64);

        // Read the NDJSON byte stream and forward content fragments
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = LineBuffer::default();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                lines.extend(&bytes);

                while let Some(line) = lines.next_line() {
                    let Some(chunk) = parse_stream_line(&line) else {
                        continue;
                    };
                    let done = chunk.done;
                    if tx.send(Ok(chunk)).await.is_err() {
                        return; // receiver dropped
                    }
                    if done {
                        return;
                    }
                }
            }

            // Trailing line without a newline
            if let Some(chunk) = lines.remainder().as_deref().and_then(parse_stream_line)
                && tx.send(Ok(chunk)).await.is_err()
            {
                return;
            }

            let _ = tx
                .send(Ok(StreamChunk {
                    content: None,
                    done: true,
                }))
                .await;
        });

        Ok(rx)
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        let url = format!("{}/api/embeddings", self.base_url);
        debug!(model = %request.model, chars = request.prompt.len(), "Sending embedding request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        response
            .json::<EmbeddingResponse>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_transport_error)?;

        Ok(response.status().is_success())
    }
}

// --- Ollama API types (internal) ---

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ApiMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_ctx: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    message: ApiMessage,
}

/// One NDJSON line of a streamed reply.
#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    message: Option<ApiMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

//! Inference client — one structured query with bounded corrective retry.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};
use vitalis_config::AppConfig;
use vitalis_core::error::ProviderError;
use vitalis_core::message::{Message, build_turn};
use vitalis_core::{ParsedResult, Provider, ProviderRequest, ResponseFormat};
use vitalis_repair::parse_structured;

const DEFAULT_CORRECTION: &str =
    "\nIMPORTANT: You previously outputted invalid JSON. Fix syntax. Ensure all keys are present.";

/// A single structured query.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub prompt: String,
    pub system: Option<String>,
    /// Base64-encoded images attached to the user message.
    pub images: Vec<String>,
    /// Overrides the client's temperature for this query.
    pub temperature: Option<f32>,
}

impl QueryRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Sends structured queries to the provider and repairs the replies.
///
/// Never surfaces an error: a provider failure, or a reply that is still
/// unparseable after the retry budget, comes back as [`ParsedResult::Absent`].
#[derive(Clone)]
pub struct InferenceClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    image_temperature: f32,
    context_window: u32,
    max_retries: u32,
    correction: String,
}

impl InferenceClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.1,
            image_temperature: 0.2,
            context_window: 4096,
            max_retries: 1,
            correction: DEFAULT_CORRECTION.into(),
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self {
            provider,
            model: config.ollama.model.clone(),
            temperature: config.generation.temperature,
            image_temperature: config.generation.image_temperature,
            context_window: config.generation.context_window,
            max_retries: config.generation.max_retries,
            correction: config.prompts.correction.clone(),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn context_window(&self) -> u32 {
        self.context_window
    }

    /// Run `request`, retrying with the corrective suffix while the reply
    /// is unparseable and budget remains.
    pub async fn query(&self, request: &QueryRequest) -> ParsedResult {
        let mut prompt = request.prompt.clone();
        let mut retries_left = self.max_retries;

        loop {
            let raw = match self.send(request, &prompt).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(model = %self.model, error = %e, "Inference request failed");
                    return ParsedResult::Absent;
                }
            };

            let parsed = parse_structured(&raw);
            if !parsed.is_absent() || retries_left == 0 {
                return parsed;
            }

            retries_left -= 1;
            warn!(
                model = %self.model,
                attempt = self.max_retries - retries_left,
                "Reply was not valid JSON, retrying with stricter prompt"
            );
            prompt.push_str(&self.correction);
        }
    }

    /// Analyze an image: the bytes are base64-encoded and attached to the
    /// prompt, and the query runs at the image temperature.
    pub async fn analyze_image(&self, image: &[u8], prompt: &str) -> ParsedResult {
        let request = QueryRequest::new(prompt)
            .with_images(vec![STANDARD.encode(image)])
            .with_temperature(self.image_temperature);
        self.query(&request).await
    }

    async fn send(&self, request: &QueryRequest, prompt: &str) -> Result<String, ProviderError> {
        let user = Message::user(prompt).with_images(request.images.clone());
        let messages = build_turn(request.system.as_deref(), user);
        let provider_request = ProviderRequest::new(&self.model, messages)
            .with_temperature(request.temperature.unwrap_or(self.temperature))
            .with_context_window(self.context_window)
            .with_format(ResponseFormat::Json);

        debug!(model = %self.model, chars = prompt.len(), "Querying model");
        let response = self.provider.complete(provider_request).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use vitalis_core::ProviderResponse;

    /// Replays scripted replies in order and records every request.
    pub(crate) struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        pub(crate) requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn texts(replies: &[&str]) -> Arc<Self> {
            Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
        }

        pub(crate) fn requests(&self) -> Vec<ProviderRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let model = request.model.clone();
            self.requests.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Network("script exhausted".into())))?;
            Ok(ProviderResponse { content: reply, model })
        }
    }

    fn last_user_prompt(request: &ProviderRequest) -> &str {
        &request.messages.last().unwrap().content
    }

    #[tokio::test]
    async fn valid_reply_needs_one_call() {
        let provider = ScriptedProvider::texts(&[r#"{"response": "hi"}"#]);
        let client = InferenceClient::new(provider.clone(), "gemma3:12b");

        let parsed = client
            .query(&QueryRequest::new("hello").with_system("Return JSON"))
            .await;
        assert_eq!(parsed.get("response").and_then(|v| v.as_str()), Some("hi"));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].format, Some(ResponseFormat::Json));
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].messages[0].content, "Return JSON");
    }

    #[tokio::test]
    async fn retry_appends_correction_once() {
        let provider = ScriptedProvider::texts(&["not json at all", r#"{"ok": true}"#]);
        let client = InferenceClient::new(provider.clone(), "m");

        let parsed = client.query(&QueryRequest::new("plan my week")).await;
        assert!(!parsed.is_absent());

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(last_user_prompt(&requests[0]), "plan my week");
        assert_eq!(
            last_user_prompt(&requests[1]),
            format!("plan my week{DEFAULT_CORRECTION}")
        );
    }

    #[tokio::test]
    async fn budget_exhausted_gives_absent() {
        let provider = ScriptedProvider::texts(&["nope", "still nope", "never sent"]);
        let client = InferenceClient::new(provider.clone(), "m");

        assert!(client.query(&QueryRequest::new("x")).await.is_absent());
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn zero_budget_means_single_attempt() {
        let provider = ScriptedProvider::texts(&["nope", r#"{"a": 1}"#]);
        let client = InferenceClient::new(provider.clone(), "m").with_max_retries(0);

        assert!(client.query(&QueryRequest::new("x")).await.is_absent());
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn provider_error_is_absent_without_retry() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::ApiError {
            status_code: 500,
            message: "boom".into(),
        })]);
        let client = InferenceClient::new(provider.clone(), "m");

        assert!(client.query(&QueryRequest::new("x")).await.is_absent());
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn truncated_reply_is_repaired() {
        let provider = ScriptedProvider::texts(&[r#"Sure! {"meals": [{"day": "Mon", "title": "Oats""#]);
        let client = InferenceClient::new(provider, "m");

        let parsed = client.query(&QueryRequest::new("x")).await;
        assert_eq!(
            parsed.into_value(),
            Some(serde_json::json!({"meals": [{"day": "Mon", "title": "Oats"}]}))
        );
    }

    #[tokio::test]
    async fn image_is_base64_encoded() {
        let provider = ScriptedProvider::texts(&[r#"{"meal_name": "Salad"}"#]);
        let client = InferenceClient::new(provider.clone(), "m");

        let parsed = client.analyze_image(b"hello", "What is on this plate?").await;
        assert!(!parsed.is_absent());

        let request = &provider.requests()[0];
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].images, vec!["aGVsbG8=".to_string()]);
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
    }
}

//! Session-aware assistant: document indexing and analysis, retrieval-grounded
//! chat, and streamed chat.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info};
use vitalis_config::{AppConfig, PromptsConfig, StreamingConfig};
use vitalis_core::error::MemoryError;
use vitalis_core::message::Message;
use vitalis_core::{
    ChatTurn, ChunkedDocument, IngestedDocument, ParsedResult, Provider, ProviderRequest, Result,
    SessionStore, ToolRegistry, TurnRole,
};
use vitalis_memory::{EmbeddingCache, EmbeddingClient, Retriever};

use crate::agent_loop::AgentLoop;
use crate::client::{InferenceClient, QueryRequest};
use crate::stream::stream_reply;

const NO_SUMMARY: &str = "No data.";

pub struct Assistant {
    agent: AgentLoop,
    retriever: Retriever,
    sessions: Arc<dyn SessionStore>,
    prompts: PromptsConfig,
    streaming: StreamingConfig,
}

impl Assistant {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        sessions: Arc<dyn SessionStore>,
        cache: EmbeddingCache,
        config: &AppConfig,
    ) -> Self {
        let client = InferenceClient::from_config(provider.clone(), config);
        let agent = AgentLoop::new(client, tools).with_max_tool_rounds(config.generation.max_tool_rounds);
        let embedder = EmbeddingClient::new(provider, &config.ollama.embedding_model, cache);
        Self {
            agent,
            retriever: Retriever::new(embedder, &config.retrieval),
            sessions,
            prompts: config.prompts.clone(),
            streaming: config.streaming.clone(),
        }
    }

    pub fn agent(&self) -> &AgentLoop {
        &self.agent
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Embed the document's chunks and make them the session's corpus.
    pub async fn index_document(&self, key: &str, document: &IngestedDocument) -> Result<usize> {
        require_key(key)?;
        let corpus = self.retriever.index_chunks(&document.chunks).await?;
        let indexed = corpus.len();
        self.sessions.set_corpus(key, corpus).await?;
        Ok(indexed)
    }

    /// Index the document, then ask the model for a structured analysis of
    /// its leading text. An object answer is stored as the session's analysis.
    pub async fn analyze_document(&self, key: &str, document: &IngestedDocument) -> Result<ParsedResult> {
        self.index_document(key, document).await?;
        let excerpt: String = document
            .full_text
            .chars()
            .take(self.prompts.analysis_char_limit)
            .collect();
        let request = QueryRequest::new(format!("DATA: {excerpt}\n\n{}", self.prompts.analysis_task))
            .with_system(&self.prompts.analysis_system);

        let parsed = self.agent.client().query(&request).await;
        if let ParsedResult::Object(map) = &parsed {
            self.sessions.set_analysis(key, Value::Object(map.clone())).await?;
            info!(session = %key, "Stored document analysis");
        }
        Ok(parsed)
    }

    /// Answer one chat message, grounded in the session's analysis summary
    /// and the corpus chunks most similar to the message.
    ///
    /// Always yields an object; when the model produces nothing usable, the
    /// configured fallback reply is returned.
    pub async fn chat(&self, key: &str, message: &str) -> Result<Value> {
        let record = self.sessions.snapshot(key).await?;
        let evidence = self.prepare_evidence(key, &record.corpus, message).await?;
        let system = self.chat_system_prompt(record.summary(), &evidence);

        let parsed = self.agent.run(QueryRequest::new(message).with_system(system)).await;
        let reply = parsed.or_else_value(|| json!({ "response": self.prompts.chat_fallback }));

        let mut turns = vec![ChatTurn::user(message)];
        if let Some(text) = reply.get("response").and_then(Value::as_str) {
            turns.push(ChatTurn::assistant(text));
        }
        self.sessions.append_turns(key, turns).await?;
        Ok(reply)
    }

    /// Stream a chat reply. The session's history is replayed to the model,
    /// and the exchange is recorded once the stream completes.
    pub async fn chat_stream(&self, key: &str, message: &str) -> Result<mpsc::Receiver<String>> {
        let record = self.sessions.snapshot(key).await?;
        let evidence = self.prepare_evidence(key, &record.corpus, message).await?;

        let mut messages = vec![Message::system(
            self.chat_system_prompt(record.summary(), &evidence),
        )];
        messages.extend(record.chat_history.iter().map(|turn| match turn.role {
            TurnRole::User => Message::user(&turn.text),
            TurnRole::Assistant => Message::assistant(&turn.text),
        }));
        messages.push(Message::user(message));

        let client = self.agent.client();
        let request = ProviderRequest::new(client.model(), messages)
            .with_temperature(self.streaming.temperature)
            .with_context_window(client.context_window())
            .streaming();
        let mut upstream = stream_reply(
            client.provider().clone(),
            request,
            self.agent.tools().clone(),
            self.streaming.classify_threshold,
        );

        let (tx, rx) = mpsc::channel(32);
        let sessions = self.sessions.clone();
        let key = key.to_string();
        let message = message.to_string();
        tokio::spawn(async move {
            let mut reply = String::new();
            while let Some(text) = upstream.recv().await {
                reply.push_str(&text);
                if tx.send(text).await.is_err() {
                    debug!(session = %key, "Stream consumer went away, exchange not recorded");
                    return;
                }
            }
            let turns = vec![ChatTurn::user(message), ChatTurn::assistant(reply)];
            if let Err(e) = sessions.append_turns(&key, turns).await {
                debug!(session = %key, error = %e, "Could not record streamed exchange");
            }
        });
        Ok(rx)
    }

    async fn prepare_evidence(&self, key: &str, corpus: &ChunkedDocument, message: &str) -> Result<String> {
        let evidence = self.retriever.retrieve_context(corpus, message).await;
        self.sessions.set_last_context(key, evidence.clone()).await?;
        Ok(evidence)
    }

    fn chat_system_prompt(&self, summary: Option<&str>, evidence: &str) -> String {
        format!(
            "{}\nCONTEXT: {}\nEVIDENCE: {}\n{}",
            self.prompts.chat_persona,
            summary.unwrap_or(NO_SUMMARY),
            evidence,
            self.prompts.chat_tool_hint
        )
    }
}

fn require_key(key: &str) -> std::result::Result<(), MemoryError> {
    if key.is_empty() {
        return Err(MemoryError::MissingSessionKey);
    }
    Ok(())
}

//! Configuration loading, validation, and management for Vitalis.
//!
//! Loads configuration from `~/.vitalis/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.vitalis/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Inference backend connection
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Generation options for structured queries
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Retrieval-augmented context settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Streamed chat settings
    #[serde(default)]
    pub streaming: StreamingConfig,

    /// In-memory session store settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Prompt fields consumed by the assistant
    #[serde(default)]
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Per-request timeout. Every HTTP call is bounded by it.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".into()
}
fn default_model() -> String {
    "gemma3:12b".into()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Context window (`num_ctx`) requested from the backend
    #[serde(default = "default_context_window")]
    pub context_window: u32,

    /// Corrective retries after an unparseable reply
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Tool invocations allowed per turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Temperature for image analysis
    #[serde(default = "default_image_temperature")]
    pub image_temperature: f32,
}

fn default_temperature() -> f32 {
    0.1
}
fn default_context_window() -> u32 {
    4096
}
fn default_max_retries() -> u32 {
    1
}
fn default_max_tool_rounds() -> u32 {
    1
}
fn default_image_temperature() -> f32 {
    0.2
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            context_window: default_context_window(),
            max_retries: default_max_retries(),
            max_tool_rounds: default_max_tool_rounds(),
            image_temperature: default_image_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Chunks beyond this count are not embedded
    #[serde(default = "default_max_indexed_chunks")]
    pub max_indexed_chunks: usize,

    /// Paragraphs at or below this length are dropped by the chunker
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,

    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_top_k() -> usize {
    3
}
fn default_max_indexed_chunks() -> usize {
    60
}
fn default_min_chunk_chars() -> usize {
    50
}
fn default_separator() -> String {
    "\n---\n".into()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_indexed_chunks: default_max_indexed_chunks(),
            min_chunk_chars: default_min_chunk_chars(),
            separator: default_separator(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Characters buffered before a reply is classified as plain text
    #[serde(default = "default_classify_threshold")]
    pub classify_threshold: usize,

    #[serde(default = "default_stream_temperature")]
    pub temperature: f32,
}

fn default_classify_threshold() -> usize {
    10
}
fn default_stream_temperature() -> f32 {
    0.7
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            classify_threshold: default_classify_threshold(),
            temperature: default_stream_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions kept before the oldest is evicted
    #[serde(default = "default_session_capacity")]
    pub capacity: usize,
}

fn default_session_capacity() -> usize {
    100
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: default_session_capacity(),
        }
    }
}

/// Declared prompt fields. Each feature reads its own fields; none are
/// looked up by name at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Opening line of the chat system instruction
    #[serde(default = "default_chat_persona")]
    pub chat_persona: String,

    /// Tells the model how to request a tool or answer directly
    #[serde(default = "default_chat_tool_hint")]
    pub chat_tool_hint: String,

    /// Reply used when the model produces nothing usable
    #[serde(default = "default_chat_fallback")]
    pub chat_fallback: String,

    #[serde(default = "default_analysis_system")]
    pub analysis_system: String,

    /// Task and output shape appended after the document text
    #[serde(default = "default_analysis_task")]
    pub analysis_task: String,

    /// Leading characters of a document sent for analysis
    #[serde(default = "default_analysis_char_limit")]
    pub analysis_char_limit: usize,

    /// Appended to the prompt when a reply must be retried
    #[serde(default = "default_correction")]
    pub correction: String,
}

fn default_chat_persona() -> String {
    "Medical Assistant.".into()
}
fn default_chat_tool_hint() -> String {
    concat!(
        "If user asks for BMI/Calories calculation, output JSON: ",
        r#"{ "tool": "calculate_bmi" or "estimate_daily_calories", "args": { ... } }"#,
        "\nOtherwise output JSON: ",
        r#"{ "response": "Your answer..." }"#
    )
    .into()
}
fn default_chat_fallback() -> String {
    "I'm having trouble analyzing that.".into()
}
fn default_analysis_system() -> String {
    "You are a Functional Doctor. Diagnose the user. Return strict JSON.".into()
}
fn default_analysis_task() -> String {
    concat!(
        "TASK: Identify the top 3 health issues from this bloodwork.\n",
        "For each issue, provide 2 distinct ways to fix it (e.g., Diet vs. Lifestyle).\n\n",
        "OUTPUT JSON FORMAT:\n",
        r#"{ "patient_name": "User", "health_score": 78, "summary": "Short overall health summary.", "#,
        r#""biomarkers": [{ "name": "Vitamin D", "value": "18", "unit": "ng/mL", "status": "Low" }], "#,
        r#""issues": [{ "title": "Low Vitamin D", "severity": "High", "value": "18 ng/mL", "#,
        r#""explanation": "...", "options": [{ "type": "Dietary", "text": "..." }] }] }"#
    )
    .into()
}
fn default_analysis_char_limit() -> usize {
    8000
}
fn default_correction() -> String {
    "\nIMPORTANT: You previously outputted invalid JSON. Fix syntax. Ensure all keys are present."
        .into()
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            chat_persona: default_chat_persona(),
            chat_tool_hint: default_chat_tool_hint(),
            chat_fallback: default_chat_fallback(),
            analysis_system: default_analysis_system(),
            analysis_task: default_analysis_task(),
            analysis_char_limit: default_analysis_char_limit(),
            correction: default_correction(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.vitalis/config.toml).
    ///
    /// Environment variables override the file:
    /// - `OLLAMA_URL`
    /// - `OLLAMA_MODEL`
    /// - `VITALIS_EMBEDDING_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`AppConfig::load`]).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("OLLAMA_URL").filter(|v| !v.is_empty()) {
            self.ollama.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL").filter(|v| !v.is_empty()) {
            self.ollama.model = model;
        }
        if let Some(model) = lookup("VITALIS_EMBEDDING_MODEL").filter(|v| !v.is_empty()) {
            self.ollama.embedding_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vitalis")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("generation.temperature", self.generation.temperature),
            ("generation.image_temperature", self.generation.image_temperature),
            ("streaming.temperature", self.streaming.temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 2.0"
                )));
            }
        }

        if self.ollama.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "ollama.request_timeout_secs must be > 0".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".into(),
            ));
        }

        if self.streaming.classify_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "streaming.classify_threshold must be > 0".into(),
            ));
        }

        if self.session.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "session.capacity must be > 0".into(),
            ));
        }

        let required = [
            ("ollama.base_url", &self.ollama.base_url),
            ("ollama.model", &self.ollama.model),
            ("ollama.embedding_model", &self.ollama.embedding_model),
            ("prompts.chat_persona", &self.prompts.chat_persona),
            ("prompts.chat_tool_hint", &self.prompts.chat_tool_hint),
            ("prompts.chat_fallback", &self.prompts.chat_fallback),
            ("prompts.analysis_system", &self.prompts.analysis_system),
            ("prompts.analysis_task", &self.prompts.analysis_task),
            ("prompts.correction", &self.prompts.correction),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!("{name} must not be empty")));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `config init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

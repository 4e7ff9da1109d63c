pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod doctor;
pub mod repair;

use std::sync::Arc;

use vitalis_config::AppConfig;
use vitalis_core::Provider;
use vitalis_providers::OllamaProvider;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, Box<dyn std::error::Error>> {
    let provider = OllamaProvider::from_config(&config.ollama)
        .map_err(|e| format!("Failed to create Ollama client: {e}"))?;
    Ok(Arc::new(provider))
}

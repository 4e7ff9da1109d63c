//! `vitalis config` — Configuration management commands.

use vitalis_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");
            println!();
            println!("   Ollama:     {}", config.ollama.base_url);
            println!("   Model:      {}", config.ollama.model);
            println!("   Embeddings: {}", config.ollama.embedding_model);
            println!("   Retries:    {}", config.generation.max_retries);
            println!("   Top-k:      {}", config.retrieval.top_k);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("  Config already exists: {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config: {}", config_path.display());
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = vitalis_config::AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains(".vitalis"));
    }

    #[test]
    fn default_toml_round_trips() {
        let text = vitalis_config::AppConfig::default_toml();
        let parsed: vitalis_config::AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.ollama.model, "gemma3:12b");
        assert!(parsed.validate().is_ok());
    }
}

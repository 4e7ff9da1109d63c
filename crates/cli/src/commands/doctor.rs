//! `vitalis doctor` — Diagnose configuration and model availability.

use vitalis_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Vitalis Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file, using defaults — run `vitalis config init`");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!();
            println!("  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    // Check the server
    let provider = super::build_provider(&config)?;
    match provider.health_check().await {
        Ok(true) => println!("  ✅ Ollama reachable at {}", config.ollama.base_url),
        Ok(false) | Err(_) => {
            println!("  ❌ Ollama not reachable at {} — is `ollama serve` running?", config.ollama.base_url);
            issues += 1;
        }
    }

    // Check models
    match provider.list_models().await {
        Ok(models) => {
            for wanted in [&config.ollama.model, &config.ollama.embedding_model] {
                if models.iter().any(|m| model_matches(m, wanted)) {
                    println!("  ✅ Model available: {wanted}");
                } else {
                    println!("  ⚠️  Model missing: {wanted} — run `ollama pull {wanted}`");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ⚠️  Could not list models: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Ollama reports `name:tag`; a wanted name without a tag means `latest`.
fn model_matches(available: &str, wanted: &str) -> bool {
    available == wanted || (!wanted.contains(':') && available == format!("{wanted}:latest"))
}

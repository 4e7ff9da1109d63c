//! `vitalis ask` — One structured query.

use std::path::PathBuf;
use std::sync::Arc;

use vitalis_agent::{AgentLoop, InferenceClient, QueryRequest};
use vitalis_core::ParsedResult;

pub async fn run(
    prompt: String,
    system: Option<String>,
    image: Option<PathBuf>,
    tools: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let provider = super::build_provider(&config)?;
    let client = InferenceClient::from_config(provider, &config);

    eprint!("  Thinking...");
    let parsed = match image {
        Some(path) => {
            let bytes = std::fs::read(&path)
                .map_err(|e| format!("Failed to read image {}: {e}", path.display()))?;
            client.analyze_image(&bytes, &prompt).await
        }
        None => {
            let mut request = QueryRequest::new(prompt);
            if let Some(system) = system {
                request = request.with_system(system);
            }
            if tools {
                AgentLoop::new(client, Arc::new(vitalis_tools::default_registry()))
                    .with_max_tool_rounds(config.generation.max_tool_rounds)
                    .run(request)
                    .await
            } else {
                client.query(&request).await
            }
        }
    };
    eprint!("\r              \r");

    print_parsed(&parsed)
}

fn print_parsed(parsed: &ParsedResult) -> Result<(), Box<dyn std::error::Error>> {
    if parsed.is_absent() {
        return Err("The model did not return usable JSON. Run with --verbose for details.".into());
    }
    println!("{}", serde_json::to_string_pretty(parsed)?);
    Ok(())
}

//! `vitalis chat` — Document-grounded chat, single message or interactive.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use vitalis_agent::Assistant;
use vitalis_memory::{EmbeddingCache, InMemorySessionStore, ingest_text};

pub async fn run(
    document: Option<PathBuf>,
    session: String,
    stream: bool,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let provider = super::build_provider(&config)?;
    let assistant = Assistant::new(
        provider,
        Arc::new(vitalis_tools::default_registry()),
        Arc::new(InMemorySessionStore::new(config.session.capacity)),
        EmbeddingCache::new(),
        &config,
    );

    if let Some(path) = document {
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let document = ingest_text(text, config.retrieval.min_chunk_chars);

        eprint!("  Analyzing {} ({} chunks)...", path.display(), document.chunks.len());
        let analysis = assistant.analyze_document(&session, &document).await?;
        eprint!("\r\x1b[2K");
        match analysis.get("summary").and_then(|v| v.as_str()) {
            Some(summary) => println!("  Summary: {summary}\n"),
            None => eprintln!("  ⚠️  No analysis available; chatting without a summary.\n"),
        }
    }

    if let Some(msg) = message {
        return reply(&assistant, &session, &msg, stream).await;
    }

    // Interactive mode
    println!();
    println!("  Vitalis Chat — session '{session}'");
    println!("  Model: {}", config.ollama.model);
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }
        if let Err(e) = reply(&assistant, &session, line, stream).await {
            eprintln!("  [Error] {e}");
        }
        println!();
    }

    println!();
    println!("  Goodbye! 👋");
    Ok(())
}

async fn reply(
    assistant: &Assistant,
    session: &str,
    message: &str,
    stream: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if stream {
        let mut rx = assistant.chat_stream(session, message).await?;
        print!("  Assistant > ");
        while let Some(text) = rx.recv().await {
            print!("{text}");
            std::io::stdout().flush()?;
        }
        println!();
        return Ok(());
    }

    let reply = assistant.chat(session, message).await?;
    match reply.get("response").and_then(|v| v.as_str()) {
        Some(text) => {
            for line in text.lines() {
                println!("  Assistant > {line}");
            }
        }
        None => println!("{}", serde_json::to_string_pretty(&reply)?),
    }
    Ok(())
}

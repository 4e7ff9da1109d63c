//! Vitalis CLI — the main entry point.
//!
//! Commands:
//! - `ask`     — One structured query, optionally with an image or tools
//! - `chat`    — Session chat grounded in an ingested document
//! - `repair`  — Repair model output read from a file or stdin
//! - `doctor`  — Check configuration and the Ollama server
//! - `config`  — Show, initialize, or validate configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "vitalis",
    about = "Vitalis — reliable structured answers from local language models",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the structured answer
    Ask {
        /// The prompt text
        prompt: String,

        /// System instruction
        #[arg(short, long)]
        system: Option<String>,

        /// Attach an image file
        #[arg(short, long)]
        image: Option<std::path::PathBuf>,

        /// Let the model call built-in tools
        #[arg(short, long)]
        tools: bool,
    },

    /// Chat about a document
    Chat {
        /// Plain-text document to index and analyze first
        #[arg(short, long)]
        document: Option<std::path::PathBuf>,

        /// Session key
        #[arg(long, default_value = "local")]
        session: String,

        /// Stream replies as they are generated
        #[arg(long)]
        stream: bool,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Repair malformed JSON from a file or stdin
    Repair {
        /// Input file (reads stdin when omitted)
        file: Option<std::path::PathBuf>,
    },

    /// Diagnose configuration and model availability
    Doctor,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file if none exists
    Init,
    /// Print the config file path
    Path,
    /// Load and validate the config file
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    match cli.command {
        Commands::Ask {
            prompt,
            system,
            image,
            tools,
        } => commands::ask::run(prompt, system, image, tools).await?,
        Commands::Chat {
            document,
            session,
            stream,
            message,
        } => commands::chat::run(document, session, stream, message).await?,
        Commands::Repair { file } => commands::repair::run(file).await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}

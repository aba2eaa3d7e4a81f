//! # repo-chat CLI (`rchat`)
//!
//! Analyze a local repository with a locally hosted model runtime and
//! chat about its contents.
//!
//! ```bash
//! rchat --config ./config/rchat.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rchat analyze <path>` | Load, index, summarize; writes the summary file |
//! | `rchat ask "<question>"` | Answer against the index persisted by a prior analyze |
//! | `rchat chat` | Interactive console session |
//! | `rchat serve` | Start the web UI |
//! | `rchat status` | Show runtime health and model availability |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use repo_chat::assistant::{Assistant, MSG_ANALYZE_FIRST};
use repo_chat::config::{load_config, Config};
use repo_chat::console;
use repo_chat::embedding::OllamaEmbedder;
use repo_chat::runtime::OllamaRuntime;
use repo_chat::server;

/// repo-chat — chat with your repository through a local model runtime.
#[derive(Parser)]
#[command(
    name = "rchat",
    about = "Chat with your repository: local analysis, summarization, and Q&A over a local model runtime",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "./config/rchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a repository: load, index, and write the summary file.
    Analyze {
        /// Repository path to analyze.
        path: PathBuf,
    },

    /// Answer a question against the index persisted by a previous analyze.
    Ask {
        /// The question to ask.
        question: String,
    },

    /// Interactive console chat session.
    Chat {
        /// Repository path to analyze before the first question.
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Start the web UI.
    Serve,

    /// Show model runtime health and model availability.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Analyze { path } => {
            let mut assistant = build_assistant(&config).await?;
            assistant.set_repo_path(path)?;
            let message = assistant.analyze().await?;
            println!("{}", message);
        }
        Commands::Ask { question } => {
            let mut assistant = build_assistant(&config).await?;
            if !assistant.restore_persisted_index()? {
                println!("{}", MSG_ANALYZE_FIRST);
                return Ok(());
            }
            println!("{}", assistant.ask(&question).await);
        }
        Commands::Chat { path } => {
            let mut assistant = build_assistant(&config).await?;
            if let Some(path) = path {
                assistant.set_repo_path(path)?;
            }
            console::run_console(assistant).await?;
        }
        Commands::Serve => {
            let assistant = build_assistant(&config).await?;
            server::run_server(&config, assistant).await?;
        }
        Commands::Status => {
            print_status(&config).await?;
        }
    }

    Ok(())
}

/// Wire the real runtime and embedder into an assistant, making sure the
/// runtime is up and the model is present first.
async fn build_assistant(config: &Config) -> Result<Assistant> {
    let runtime = OllamaRuntime::new(&config.runtime)?;
    runtime.ensure_ready().await?;
    let embedder = OllamaEmbedder::new(&config.runtime)?;
    Ok(Assistant::new(
        config.clone(),
        Box::new(runtime),
        Box::new(embedder),
    ))
}

async fn print_status(config: &Config) -> Result<()> {
    let runtime = OllamaRuntime::new(&config.runtime)?;
    let up = runtime.is_up().await;

    println!("{:<12} {}", "endpoint", config.runtime.endpoint);
    println!("{:<12} {}", "runtime", if up { "UP" } else { "DOWN" });

    if up {
        let present = runtime.model_present(&config.runtime.model).await?;
        println!(
            "{:<12} {} ({})",
            "model",
            config.runtime.model,
            if present { "present" } else { "missing" }
        );
        let embed_present = runtime.model_present(&config.runtime.embedding_model).await?;
        println!(
            "{:<12} {} ({})",
            "embedding",
            config.runtime.embedding_model,
            if embed_present { "present" } else { "missing" }
        );
    }

    Ok(())
}

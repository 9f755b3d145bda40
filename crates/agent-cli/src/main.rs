//! ollama-agent
//!
//! Terminal front end: an interactive chat with a tool-using agent running
//! on a local Ollama model, plus `models` and `sessions` listings.

mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use agent_runtime::OllamaProvider;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before reading flags so `.env` can set AGENT_MODEL etc.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with answers
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let provider = Arc::new(OllamaProvider::from_env()?);
    tracing::debug!(url = %provider.config().base_url(), "Using Ollama");

    match cli.command.unwrap_or(Command::Chat) {
        Command::Models => repl::list_models(provider.as_ref()).await,
        Command::Sessions => repl::list_sessions(&cli),
        Command::Chat => repl::run(&cli, provider).await,
    }
}

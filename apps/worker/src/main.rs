use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use encore_worker::jobs::{analyze_history, ingest_history};
use encore_worker::{AppState, Config, JobContext};

/// Listening-history jobs, run once per invocation
#[derive(Debug, Parser)]
#[command(name = "encore-worker", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store recently played tracks in the history store
    Ingest,
    /// Report the most repeated track with its tempo and key
    Analyze,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load worker configuration")?;

    // Logs go to stderr; stdout carries only the job output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(backend = %config.store_backend, "Starting Encore worker");

    let state = AppState::from_config(config);
    let context = JobContext::from_env();

    let output = match cli.command {
        Command::Ingest => {
            serde_json::to_string_pretty(&ingest_history::execute(&state, &context).await)
        }
        Command::Analyze => {
            serde_json::to_string_pretty(&analyze_history::execute(&state, &context).await)
        }
    }
    .context("Failed to serialize job output")?;

    println!("{}", output);
    Ok(())
}

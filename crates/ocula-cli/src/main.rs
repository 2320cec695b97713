use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod replay;
mod stream;

use config::Config;

#[derive(Parser)]
#[command(name = "ocula", version, about = "Ocular alignment diagnostics from landmark streams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a JSON-lines landmark stream through one session
    Replay {
        /// Input file (default: stdin)
        input: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the final filter state to stderr as JSON
        #[arg(long)]
        summary: bool,
    },
    /// Print the effective configuration as TOML
    Config {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the output stream; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay {
            input,
            output,
            config,
            summary,
        } => cmd_replay(input, output, config, summary).await,
        Command::Config { config } => {
            let config = Config::load(config.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn cmd_replay(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    summary: bool,
) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let writer: Box<dyn AsyncWrite + Unpin + Send> = match &output {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdout()),
    };

    let engine = engine::spawn_engine(config.session, config.channel_capacity)?;
    let (stats, _writer) = replay::replay(&engine, reader, writer).await?;

    if summary {
        let state = engine.snapshot().await?;
        eprintln!("{}", serde_json::to_string_pretty(&state)?);
    }
    if stats.frames_read == 0 {
        tracing::warn!("input stream contained no frames");
    }

    Ok(())
}

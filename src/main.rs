use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod config;
mod controller;
mod core;
mod download;
mod http_client;
mod preview;
mod provider;
mod tui;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Load or create config; the API key is injected here, never compiled in
    let mut config = Config::load_or_create()?;

    match cli.command {
        Some(Commands::Generate(args)) => {
            cli::commands::generate::run(args, &config).await?;
        }
        Some(Commands::Config(args)) => {
            cli::commands::config::run(args, &mut config)?;
        }
        None => {
            // Launch TUI
            tui::run(&config).await?;
        }
    }

    Ok(())
}

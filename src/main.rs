use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bizhire::cli::Cli;
use bizhire::config::Config;
use bizhire::Portal;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config)?;
    if let Some(api_url) = &cli.api_url {
        config.backend.base_url = api_url.clone();
    }

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("Starting bizhire v{}", env!("CARGO_PKG_VERSION"));

    // Create app state and restore any persisted session
    let portal = Portal::new(config)?;
    portal.restore();

    match &cli.command {
        Some(_) => bizhire::cli::run_command(&cli, &portal).await,
        None => bizhire::shell::run(&portal).await,
    }
}

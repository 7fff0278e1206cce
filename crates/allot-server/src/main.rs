// crates/allot-server/src/main.rs
// Allot - project allocation engine with LLM-assisted matching

mod cli;

use allot::config::AllotConfig;
use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::{Level, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (global first, then project - project overrides)
    let _ = dotenvy::from_path(AllotConfig::home_dir().join(".env"));
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging based on command
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        match &cli.command {
            Some(Commands::Serve { .. }) | None => Level::INFO,
            Some(_) => Level::WARN,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AllotConfig::load();
    let validation = config.validate();
    for warning in &validation.warnings {
        warn!("{}", warning);
    }
    if !validation.is_valid() && !matches!(cli.command, Some(Commands::Check)) {
        anyhow::bail!("Invalid configuration:\n{}", validation.report());
    }

    match cli.command {
        None => cli::run_web_server(&config, 3000).await?,
        Some(Commands::Serve { port }) => cli::run_web_server(&config, port).await?,
        Some(command) => cli::run_command(&config, command).await?,
    }

    Ok(())
}

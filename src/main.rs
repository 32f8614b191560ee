use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use toolgate::{
    api::start_server,
    observability::{init_logging, log_config_info},
    AppConfig, APP_NAME, VERSION,
};

/// License-aware tool filtering gateway for MCP servers
#[derive(Parser, Debug)]
#[command(name = "toolgate", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE", env = "TOOLGATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before any configuration is read from the environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config.observability).context("Failed to initialize logging")?;

    info!(app_name = APP_NAME, version = VERSION, "Starting toolgate");
    log_config_info(&config);

    start_server(config).await.context("Gateway exited with an error")?;
    Ok(())
}

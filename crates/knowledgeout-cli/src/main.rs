use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

mod bootstrap;
mod cli;

use cli::{Cli, Commands, LogLevel};
use knowledgeout_config::AppConfig;
use knowledgeout_sqlite::SqliteStores;
use knowledgeout_web::start_server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = match (cli.log_level, cli.verbose) {
        (Some(level), _) => level,
        (None, true) => LogLevel::Debug,
        (None, false) => LogLevel::Info,
    };
    let filter = format!(
        "knowledgeout_cli={0},knowledgeout_web={0},knowledgeout_sqlite={0}",
        level_name(level)
    );
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    // Load configuration with CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db_path {
        config.database.path = db_path;
    }

    let port_override = match cli.command {
        Some(Commands::Serve { port }) => port,
        None => None,
    };
    if let Some(port) = port_override {
        config.server.port = port;
    }

    serve(config).await
}

async fn serve(config: AppConfig) -> Result<()> {
    let stores = SqliteStores::open(config.database.clone())?;

    bootstrap::seed(&stores, &config.bootstrap).await?;

    info!(port = config.server.port, "KnowledgeOut starting");
    if config.bootstrap.admin.is_none() {
        warn!("no admin account configured; the dashboard will be unreachable");
    }

    start_server(&config.server, stores).await?;
    Ok(())
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Off => "off",
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

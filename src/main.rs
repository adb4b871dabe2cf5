use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

#[derive(Parser)]
#[command(name = "reportd", about = "Log service for the report admin backend")]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "REPORTD_PORT", default_value_t = 3000)]
    port: u16,

    /// Path to the application log file.
    #[arg(long, env = "REPORTD_LOG_FILE", default_value = "logs/app.log")]
    log_file: PathBuf,

    /// Allow the admin endpoints from non-loopback peers (for deployments
    /// behind a trusted gateway).
    #[arg(long, env = "REPORTD_ALLOW_REMOTE_ADMIN")]
    allow_remote_admin: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Diagnostics channel; the application log file is a separate concern
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting reportd");

    let config = reportd_server::ServerConfig {
        port: cli.port,
        log_file: cli.log_file,
        allow_remote_admin: cli.allow_remote_admin,
    };

    let handle = reportd_server::start(config)
        .await
        .context("failed to start server")?;

    tracing::info!(port = handle.port, "reportd ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!("Shutting down");
    handle
        .writer
        .info("Server shutting down", serde_json::Map::new());
    handle.writer.flush().await;

    Ok(())
}

//! linelog-server: line-buffering log daemon.
//!
//! Accepts producer connections over a Unix domain socket (optionally TCP),
//! buffers each connection's byte stream, and emits complete lines into the
//! server log.

mod config;
mod server;
mod session;
mod sink;

use clap::Parser;
use config::ServerConfig;
use server::LinelogServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// linelog-server — line-buffering log daemon
#[derive(Parser, Debug)]
#[command(name = "linelog-server", version, about = "Line-buffering log daemon")]
struct Cli {
    /// Unix socket path producers connect to
    #[arg(short, long)]
    socket: Option<String>,

    /// Optional TCP listen address (e.g. 127.0.0.1:5514)
    #[arg(long)]
    tcp_listen: Option<String>,

    /// Buffer capacity in bytes before a forced flush
    #[arg(long)]
    line_capacity: Option<usize>,

    /// Maximum concurrent producer sessions
    #[arg(long)]
    max_sessions: Option<usize>,

    /// Config file path
    #[arg(long, default_value = "~/.linelog/config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    use tracing_subscriber::EnvFilter;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting linelog-server");

    // Load server config (file + CLI overrides)
    let config_path = PathBuf::from(&cli.config);
    let server_config = match ServerConfig::load(
        Some(&config_path),
        cli.socket.as_deref(),
        cli.tcp_listen.as_deref(),
        cli.line_capacity,
        cli.max_sessions,
    ) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let socket_path = server_config.socket_path.clone();
    let server = Arc::new(LinelogServer::new(server_config));

    // Run until shutdown signal
    tokio::select! {
        result = server.clone().run() => {
            if let Err(e) = result {
                error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            info!("received shutdown signal");
        }
    }

    // Flush whatever the remaining producers had buffered before exiting.
    let drained = server.sessions().drain().await;
    if drained > 0 {
        info!(count = drained, "flushed remaining sessions");
    }
    let _ = std::fs::remove_file(&socket_path);

    info!("linelog-server stopped");
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}

//! Crowdcall Daemon
//!
//! The daemon owns the prediction lifecycle: it serves the gRPC API to
//! clients, runs the server-side expiration sweeper, and mirrors lifecycle
//! events to an optional secondary ledger endpoint.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crowdcall_daemon::engine::spawn_sweeper;
use crowdcall_daemon::mirror;
use crowdcall_daemon::server::{GrpcServer, ServerConfig};
use crowdcall_daemon::storage::Database;

#[derive(Parser, Debug)]
#[command(name = "crowdcall-daemon")]
#[command(version, about = "Crowdcall daemon - prediction lifecycle and rewards")]
struct Args {
    /// TCP bind address
    #[arg(long, default_value = "127.0.0.1:50061", env = "CROWDCALL_ADDR")]
    addr: SocketAddr,

    /// Database file path
    #[arg(long, env = "CROWDCALL_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Seconds between expiration sweeps
    #[arg(long, default_value_t = 15, env = "CROWDCALL_SWEEP_INTERVAL")]
    sweep_interval: u64,

    /// Leaderboard size when a request does not specify a limit
    #[arg(long, default_value_t = 10, env = "CROWDCALL_LEADERBOARD_LIMIT")]
    leaderboard_limit: u32,

    /// Secondary-ledger mirror endpoint (best-effort; disabled when unset)
    #[arg(long, env = "CROWDCALL_MIRROR_URL")]
    mirror_url: Option<String>,

    /// Log level filter for the daemon (e.g. "info", "debug", "warn").
    #[arg(long, default_value = "info", env = "CROWDCALL_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "CROWDCALL_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_filter = format!("crowdcall_daemon={}", args.log_level);
    crowdcall_core::tracing_init::init_tracing(&log_filter, args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        sweep_interval = args.sweep_interval,
        mirror = args.mirror_url.is_some(),
        "Starting crowdcall-daemon"
    );

    // Initialize database
    let db = if let Some(path) = &args.db_path {
        info!(path = %path.display(), "Opening database");
        Database::open(path).await?
    } else {
        let default_path = default_db_path()?;
        info!(path = %default_path.display(), "Opening database (default path)");
        Database::open(&default_path).await?
    };

    let mirror = mirror::from_endpoint(args.mirror_url);

    let config = ServerConfig::tcp(args.addr)
        .with_default_leaderboard_limit(args.leaderboard_limit);
    let server = GrpcServer::new(config, db, mirror);

    // Daemon-level shutdown channel (triggered by Ctrl+C or SIGTERM)
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let sweeper_handle = spawn_sweeper(
        server.sweeper(),
        Duration::from_secs(args.sweep_interval),
        shutdown_rx,
    );

    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    // Notify systemd that the daemon is ready to serve (unix only).
    #[cfg(unix)]
    sd_notify::notify(true, &[sd_notify::NotifyState::Ready])?;

    #[cfg(unix)]
    let sigterm_future = sigterm.recv();
    #[cfg(not(unix))]
    let sigterm_future = std::future::pending::<Option<()>>();

    info!(addr = %args.addr, "gRPC server ready");

    tokio::select! {
        result = server.serve_tcp(args.addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C shutdown signal");
        }
        _ = sigterm_future => {
            info!("Received SIGTERM shutdown signal");
        }
    }

    // Signal the sweeper to shut down and drain it
    let _ = shutdown_tx.send(true);
    let _ = sweeper_handle.await;

    info!("Daemon stopped");
    Ok(())
}

/// Default database path: ~/.crowdcall/daemon.db
fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".crowdcall").join("daemon.db"))
}

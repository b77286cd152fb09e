//! msg_q_server - HTTP message queue server
//!
//! Serves named in-memory queues over a small JSON API. Messages are lost
//! when the process exits.

use anyhow::Context;
use clap::Parser;
use msgq::{config::Config, router};
use msgq_queue::{spawn_sweeper, MemoryStore, QueueState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "msg_q_server")]
#[command(about = "In-memory HTTP message queue server", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "MSGQ_HOST")]
    host: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "MSGQ_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds between expiry sweeps (0 disables)
    #[arg(long)]
    sweep_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MSGQ_LOG_LEVEL")]
    log_level: String,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(secs) = self.sweep_interval {
            config.queue.sweep_interval_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "msgq={0},msgq_queue={0},msg_q_server={0},tower_http=debug",
                    args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);

    info!("Starting msg_q_server...");
    info!(
        "  Sweep interval: {}",
        match config.queue.sweep_interval_secs {
            0 => "disabled".to_string(),
            secs => format!("{secs}s"),
        }
    );
    info!("  Max content: {} bytes", config.queue.max_content_bytes);

    let store = Arc::new(MemoryStore::new().with_max_content_bytes(config.queue.max_content_bytes));

    let sweeper = (config.queue.sweep_interval_secs > 0).then(|| {
        spawn_sweeper(
            store.clone(),
            Duration::from_secs(config.queue.sweep_interval_secs),
        )
    });

    let app = router::create_router(Arc::new(QueueState::new(store.clone())), &config.queue);

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "failed to listen on {}:{}",
                config.server.host, config.server.port
            )
        })?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("received error from running server")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!(
        discarded = store.stored_messages(),
        "msg_q_server stopped"
    );

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler, continuing without it");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, continuing without it");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "msg_q_server",
            "--port",
            "9100",
            "--host",
            "127.0.0.1",
            "--sweep-interval",
            "0",
        ])
        .unwrap();

        let mut config = Config::from_toml("[server]\nport = 9000").unwrap();
        args.apply(&mut config);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.queue.sweep_interval_secs, 0);
        assert_eq!(config.queue.max_content_bytes, 262_144);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let args = Args::try_parse_from(["msg_q_server", "--log-level", "debug"]).unwrap();
        assert_eq!(args.log_level, "debug");

        let mut config =
            Config::from_toml("[server]\nport = 9000\n\n[queue]\nsweep_interval_secs = 5")
                .unwrap();
        args.apply(&mut config);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.queue.sweep_interval_secs, 5);
    }

    #[test]
    fn test_bad_flag_value_is_rejected() {
        assert!(Args::try_parse_from(["msg_q_server", "--port", "eighty"]).is_err());
        assert!(Args::try_parse_from(["msg_q_server", "--sweep-interval", "-1"]).is_err());
    }
}

//! CinderKV server entry point.
//!
//! Sets up logging, restores the keyspace from its snapshot, starts the
//! snapshot scheduler and the TCP listener, and saves once more on Ctrl+C.

use anyhow::Context;
use cinderkv::commands::CommandHandler;
use cinderkv::config::Config;
use cinderkv::connection::{handle_connection, ConnectionStats};
use cinderkv::storage::{SnapshotScheduler, StorageEngine};
use clap::Parser;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn print_banner(config: &Config) {
    println!(
        r#"
   ___ _           _           _  ____   __
  / __(_)_ __   __| | ___ _ __| |/ /\ \ / /
 | |  | | '_ \ / _` |/ _ \ '__| ' /  \ V /
 | |__| | | | | (_| |  __/ |  | . \   | |
  \___|_|_| |_|\__,_|\___|_|  |_|\_\  |_|

CinderKV v{}
──────────────────────────────────────────
Listening on {}
Snapshot file {}

Use Ctrl+C to shutdown gracefully.
"#,
        cinderkv::VERSION,
        config.bind_address(),
        config.snapshot_path.display()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    init_tracing(&config);

    let storage = Arc::new(StorageEngine::open(&config.snapshot_path).with_context(|| {
        format!(
            "failed to load snapshot from {}",
            config.snapshot_path.display()
        )
    })?);
    let stats = storage.stats();
    info!(
        keys = stats.keys,
        volatile_keys = stats.volatile_keys,
        "Storage engine initialized"
    );

    let scheduler = config.snapshot_every().map(|interval| {
        SnapshotScheduler::start(Arc::clone(&storage), config.snapshot_path.clone(), interval)
    });
    if scheduler.is_none() {
        warn!("Periodic snapshots disabled");
    }

    let connection_stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    print_banner(&config);
    info!("Listening on {}", config.bind_address());

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = accept_loop(listener, &storage, &config, &connection_stats) => {}
        _ = shutdown => {}
    }

    drop(scheduler);

    match storage.snapshot(&config.snapshot_path) {
        Ok(()) => info!(
            path = %config.snapshot_path.display(),
            keys = storage.len(),
            "Final snapshot saved"
        ),
        Err(e) => error!(
            path = %config.snapshot_path.display(),
            error = %e,
            "Final snapshot failed"
        ),
    }

    info!(
        connections = connection_stats.connections_accepted.load(Ordering::Relaxed),
        commands = connection_stats.commands_processed.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}

/// Accepts connections forever, one task per client.
async fn accept_loop(
    listener: TcpListener,
    storage: &Arc<StorageEngine>,
    config: &Config,
    stats: &Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = CommandHandler::new(Arc::clone(storage), config.snapshot_path.clone());
                let stats = Arc::clone(stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

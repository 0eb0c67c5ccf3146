//! Server configuration.
//!
//! Every option can be given as a flag or through a `CINDERKV_*` environment
//! variable; flags win.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// CinderKV server options.
#[derive(Parser, Debug, Clone)]
#[command(name = "cinderkv")]
#[command(version, about = "In-memory key-value server with lazy expiry and MULTI/EXEC transactions")]
pub struct Config {
    /// Host to bind to
    #[arg(short = 'H', long, env = "CINDERKV_HOST", default_value = crate::DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "CINDERKV_PORT", default_value_t = crate::DEFAULT_PORT)]
    pub port: u16,

    /// Snapshot file loaded at startup and written by SAVE and the scheduler
    #[arg(long, env = "CINDERKV_SNAPSHOT_PATH", default_value = "cinderkv.snap")]
    pub snapshot_path: PathBuf,

    /// Seconds between periodic snapshots (0 disables them)
    #[arg(long, env = "CINDERKV_SNAPSHOT_INTERVAL", default_value_t = 60)]
    pub snapshot_interval: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "CINDERKV_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The periodic snapshot interval, or `None` when disabled.
    pub fn snapshot_every(&self) -> Option<Duration> {
        (self.snapshot_interval > 0).then(|| Duration::from_secs(self.snapshot_interval))
    }
}

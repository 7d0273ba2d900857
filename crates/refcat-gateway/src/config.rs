//! Gateway configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use refcat_core::StoreConfig;

/// refcat HTTP/JSON gateway command line arguments.
#[derive(Debug, Parser)]
#[command(name = "refcat-gateway")]
#[command(about = "HTTP/JSON catalog API for refcat")]
#[command(version)]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(short, long, default_value = "0.0.0.0:7000")]
    pub listen: String,

    /// Path to the SQLite database file.
    #[arg(short, long, default_value = "refcat.db")]
    pub database: PathBuf,

    /// Per-request deadline (ms) for storage work.
    #[arg(long, default_value_t = 30_000)]
    pub request_timeout_ms: u64,

    /// Time (ms) a session waits on a locked database.
    #[arg(long, default_value_t = 5_000)]
    pub busy_timeout_ms: u64,

    /// Refuse to start if any declared model fails schema checks.
    #[arg(long, default_value_t = false)]
    pub strict_schema: bool,

    /// Load the demo dataset into an empty database.
    #[arg(long, default_value_t = false)]
    pub seed_demo: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on for HTTP requests.
    pub listen_addr: String,
    /// Path to the SQLite database file.
    pub database_path: PathBuf,
    /// Per-request deadline for storage work.
    pub request_timeout: Duration,
    /// Time a session waits on a locked database.
    pub busy_timeout: Duration,
    /// Refuse to start if any declared model fails schema checks.
    pub strict_schema: bool,
    /// Load the demo dataset into an empty database.
    pub seed_demo: bool,
}

impl From<&Args> for GatewayConfig {
    fn from(args: &Args) -> Self {
        Self {
            listen_addr: args.listen.clone(),
            database_path: args.database.clone(),
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            busy_timeout: Duration::from_millis(args.busy_timeout_ms),
            strict_schema: args.strict_schema,
            seed_demo: args.seed_demo,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:7000".to_string(),
            database_path: PathBuf::from("refcat.db"),
            request_timeout: Duration::from_secs(30),
            busy_timeout: refcat_core::storage::DEFAULT_BUSY_TIMEOUT,
            strict_schema: false,
            seed_demo: false,
        }
    }
}

impl GatewayConfig {
    /// Set the per-request deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Store configuration derived from the gateway settings.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.database_path).with_busy_timeout(self.busy_timeout)
    }
}

//! Command line arguments and runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

/// Default upload server address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Default number of uploads in flight.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(name = "refcat-upload")]
#[command(version, about = "File upload server and concurrent uploader")]
pub struct Args {
    /// What to run.
    #[command(subcommand)]
    pub command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

/// The two halves of the tool.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Accept multipart uploads and store them in a directory
    Serve(ServeArgs),
    /// Upload every file of a directory
    Push(PushArgs),
}

/// Arguments of `serve`.
#[derive(Debug, clap::Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// Directory uploaded files are written to
    #[arg(short, long, default_value = "uploads")]
    pub dir: PathBuf,

    /// Largest accepted request body in megabytes
    #[arg(long, default_value_t = 64)]
    pub max_size_mb: usize,
}

/// Arguments of `push`.
#[derive(Debug, clap::Args)]
pub struct PushArgs {
    /// Upload endpoint
    #[arg(short, long, default_value = "http://localhost:5000/upload")]
    pub url: String,

    /// Directory whose files are uploaded
    #[arg(short, long, default_value = "images")]
    pub dir: PathBuf,

    /// Maximum number of uploads in flight
    #[arg(short = 'n', long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-upload timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Upload server configuration.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Socket address the server binds to.
    pub listen_addr: String,
    /// Where uploaded files are written, one file per upload.
    pub upload_dir: PathBuf,
    /// Requests with a larger body are rejected with 400.
    pub max_upload_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

impl UploadConfig {
    /// Defaults with the given upload directory.
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            ..Default::default()
        }
    }
}

impl From<&ServeArgs> for UploadConfig {
    fn from(args: &ServeArgs) -> Self {
        Self {
            listen_addr: args.listen.clone(),
            upload_dir: args.dir.clone(),
            max_upload_bytes: args.max_size_mb.saturating_mul(1024 * 1024),
        }
    }
}

/// Uploader configuration.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Upload endpoint, including the `/upload` path.
    pub url: String,
    /// Directory whose regular files are pushed.
    pub source_dir: PathBuf,
    /// Uploads in flight at once. Always at least one.
    pub concurrency: usize,
    /// Limit for a single upload request, connect included.
    pub request_timeout: Duration,
}

impl PushConfig {
    /// Defaults for pushing `source_dir` to `url`.
    pub fn new(url: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            source_dir: source_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set the number of uploads in flight; zero is raised to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

impl From<&PushArgs> for PushConfig {
    fn from(args: &PushArgs) -> Self {
        Self {
            url: args.url.clone(),
            source_dir: args.dir.clone(),
            concurrency: args.concurrency.max(1),
            request_timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_defaults() {
        let args = Args::parse_from(["refcat-upload", "push"]);
        let Command::Push(push) = &args.command else {
            panic!("expected push subcommand");
        };

        let config = PushConfig::from(push);
        assert_eq!(config.url, "http://localhost:5000/upload");
        assert_eq!(config.source_dir, PathBuf::from("images"));
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let args = Args::parse_from(["refcat-upload", "push", "-n", "0"]);
        let Command::Push(push) = &args.command else {
            panic!("expected push subcommand");
        };
        assert_eq!(PushConfig::from(push).concurrency, 1);
        assert_eq!(PushConfig::new("u", "d").with_concurrency(0).concurrency, 1);
    }

    #[test]
    fn test_serve_args() {
        let args = Args::parse_from([
            "refcat-upload",
            "serve",
            "--listen",
            "127.0.0.1:8080",
            "--dir",
            "/tmp/in",
            "--max-size-mb",
            "2",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.log_level, "debug");
        let Command::Serve(serve) = &args.command else {
            panic!("expected serve subcommand");
        };

        let config = UploadConfig::from(serve);
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/in"));
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
    }
}

//! File upload tooling.
//!
//! `server` accepts multipart uploads into a directory; `client` pushes the
//! files of a directory to such a server with a bounded number of requests
//! in flight.

pub mod client;
pub mod config;
pub mod error;
pub mod server;

pub use client::{FailedUpload, UploadReport, Uploaded, Uploader};
pub use config::{Args, Command, PushConfig, UploadConfig};
pub use error::UploadError;
pub use server::{create_router, sanitize_file_name, serve, UploadResponse};

//! Bounded-concurrency uploader.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::PushConfig;
use crate::error::UploadError;
use crate::server::{UploadResponse, FILE_PART};

/// A file the server accepted.
#[derive(Debug, Clone)]
pub struct Uploaded {
    /// Local path of the file.
    pub file: PathBuf,
    /// Message returned by the server.
    pub message: String,
}

/// A file that could not be uploaded.
#[derive(Debug, Clone)]
pub struct FailedUpload {
    /// Local path of the file.
    pub file: PathBuf,
    /// Why the upload failed, as reported by the error.
    pub reason: String,
}

/// Outcome of uploading a directory, in file name order.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Files the server accepted.
    pub succeeded: Vec<Uploaded>,
    /// Files that could not be uploaded.
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    /// Number of files attempted.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// True when no upload failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Posts files to an upload endpoint with at most `concurrency` requests
/// in flight.
#[derive(Clone)]
pub struct Uploader {
    client: Client,
    url: Arc<str>,
    limiter: Arc<Semaphore>,
}

impl Uploader {
    /// Build an uploader with its own HTTP client.
    ///
    /// Fails only if the client cannot be constructed.
    pub fn new(config: &PushConfig) -> Result<Self, UploadError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            url: Arc::from(config.url.as_str()),
            limiter: Arc::new(Semaphore::new(config.concurrency.max(1))),
        })
    }

    /// Upload one file, waiting for a free slot first.
    pub async fn upload_file(&self, path: &Path) -> Result<String, UploadError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| UploadError::Internal("upload limiter closed".into()))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::BadRequest(format!("{} has no file name", path.display())))?;
        debug!(file = %file_name, "uploading");

        let contents = tokio::fs::read(path).await?;
        let part = Part::bytes(contents)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = Form::new().part(FILE_PART, part);

        let response = self.client.post(&*self.url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: UploadResponse = response.json().await?;
        Ok(body.message)
    }

    /// Upload every regular file directly inside `dir`.
    ///
    /// A failed upload is logged and recorded in the report; it never stops
    /// the others. Only an unreadable directory is an error.
    pub async fn upload_dir(&self, dir: &Path) -> Result<UploadReport, UploadError> {
        let files = list_files(dir).await?;
        info!(dir = %dir.display(), files = files.len(), "starting uploads");

        let handles: Vec<_> = files
            .into_iter()
            .map(|path| {
                let uploader = self.clone();
                let task_path = path.clone();
                let handle =
                    tokio::spawn(async move { uploader.upload_file(&task_path).await });
                (path, handle)
            })
            .collect();

        let mut report = UploadReport::default();
        for (file, handle) in handles {
            match handle.await {
                Ok(Ok(message)) => {
                    info!(file = %file.display(), %message, "uploaded");
                    report.succeeded.push(Uploaded { file, message });
                }
                Ok(Err(e)) => {
                    warn!(file = %file.display(), error = %e, "upload failed");
                    report.failed.push(FailedUpload {
                        file,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(file = %file.display(), error = %e, "upload task aborted");
                    report.failed.push(FailedUpload {
                        file,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "uploads finished"
        );
        Ok(report)
    }
}

/// Regular files directly inside `dir`, sorted by name.
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, UploadError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

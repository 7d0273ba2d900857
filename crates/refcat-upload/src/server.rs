//! Multipart upload endpoint.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection, DefaultBodyLimit, Multipart, State,
    },
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::UploadConfig;
use crate::error::UploadError;

/// Name of the multipart part carrying the file.
pub const FILE_PART: &str = "file";

/// Body of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
}

#[derive(Clone)]
struct ServerState {
    upload_dir: Arc<PathBuf>,
}

/// Build the upload router. The upload directory must already exist.
pub fn create_router(config: &UploadConfig) -> Router {
    let state = ServerState {
        upload_dir: Arc::new(config.upload_dir.clone()),
    };

    Router::new()
        .route("/upload", post(handle_upload))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the upload directory, bind and serve until `shutdown` resolves.
pub async fn serve<F>(config: UploadConfig, shutdown: F) -> Result<(), UploadError>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(
        listen = %config.listen_addr,
        dir = %config.upload_dir.display(),
        "upload server listening"
    );

    axum::serve(listener, create_router(&config))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn handle_upload(
    State(state): State<ServerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, UploadError> {
    let mut multipart = multipart.map_err(|e| UploadError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_PART) {
            continue;
        }

        let raw_name = field.file_name().unwrap_or_default().to_string();
        let file_name = sanitize_file_name(&raw_name)
            .ok_or_else(|| UploadError::BadRequest(format!("unusable file name {:?}", raw_name)))?;
        let contents = field
            .bytes()
            .await
            .map_err(|e| UploadError::BadRequest(e.body_text()))?;

        let target = state.upload_dir.join(&file_name);
        tokio::fs::write(&target, &contents).await?;
        info!(file = %file_name, bytes = contents.len(), "stored upload");

        return Ok(Json(UploadResponse {
            message: format!("File {} uploaded successfully", file_name),
        }));
    }

    Err(UploadError::BadRequest(format!(
        "missing `{}` part",
        FILE_PART
    )))
}

/// Reduce a client-supplied file name to a bare name that stays inside the
/// upload directory.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return None;
    }
    // Must not resolve to anything but a single normal component.
    let mut components = Path::new(base).components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) => Some(base.to_string()),
        _ => None,
    }
}

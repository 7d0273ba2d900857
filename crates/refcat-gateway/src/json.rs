//! JSON request and response types for the HTTP gateway.

use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Gateway version.
    pub version: String,
    /// Whether a storage session could be opened.
    pub storage_connected: bool,
    /// Number of served models.
    pub models: usize,
}

/// Successful write response.
#[derive(Debug, Serialize)]
pub struct InsertResponse {
    /// Always `"ok"`.
    pub result: &'static str,
    /// Number of rows inserted.
    pub inserted: usize,
}

impl InsertResponse {
    /// Create a success response.
    pub fn ok(inserted: usize) -> Self {
        Self {
            result: "ok",
            inserted,
        }
    }
}

/// Query parameters for catalog reads.
#[derive(Debug, Deserialize)]
pub struct ScopeParams {
    /// Scope (section) the rows must belong to.
    pub section_id: Option<i64>,
}

//! Catalog read and write endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use refcat_core::CatalogRow;

use crate::error::AppError;
use crate::json::{InsertResponse, ScopeParams};
use crate::AppState;

/// Catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/catalogs/:catalog_name",
        get(handle_fetch_rows).post(handle_insert_rows),
    )
}

/// Read the rows of a catalog within a section.
async fn handle_fetch_rows(
    State(state): State<AppState>,
    Path(catalog_name): Path<String>,
    params: Result<Query<ScopeParams>, QueryRejection>,
) -> Result<Json<Vec<CatalogRow>>, AppError> {
    // Unknown catalogs are rejected before any storage work.
    state.service.resolve(&catalog_name)?;

    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let section_id = params
        .section_id
        .ok_or_else(|| AppError::BadRequest("section_id query parameter is required".into()))?;

    let rows = state
        .run_blocking(move |service| service.fetch_rows(&catalog_name, section_id))
        .await?;
    Ok(Json(rows))
}

/// Validate and insert one record or an array of records.
async fn handle_insert_rows(
    State(state): State<AppState>,
    Path(catalog_name): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<InsertResponse>, AppError> {
    state.service.resolve(&catalog_name)?;

    let Json(payload) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let inserted = state
        .run_blocking(move |service| service.insert_rows(&catalog_name, &payload))
        .await?;
    Ok(Json(InsertResponse::ok(inserted)))
}

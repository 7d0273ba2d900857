//! Catalog discovery endpoint.

use axum::{extract::State, routing::get, Json, Router};
use refcat_core::CatalogDescription;

use crate::AppState;

/// Discovery routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/catalogs/mapping", get(handle_mapping))
}

/// Describe every reference catalog.
async fn handle_mapping(State(state): State<AppState>) -> Json<Vec<CatalogDescription>> {
    Json(state.service.list_catalogs())
}

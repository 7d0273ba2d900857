//! refcat HTTP/JSON gateway.
//!
//! Exposes the catalog services over REST: discovery of reference catalogs,
//! scoped reads and validated batch inserts.

pub mod config;
pub mod error;
pub mod json;
pub mod routes;

pub use config::{Args, GatewayConfig};
pub use error::AppError;

use std::time::Instant;

use axum::Router;
use refcat_core::CatalogService;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Catalog services.
    pub service: CatalogService,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new application state.
    pub fn new(service: CatalogService, config: GatewayConfig) -> Self {
        Self { service, config }
    }

    /// Run blocking storage work off the async runtime, under the
    /// per-request deadline.
    ///
    /// The deadline is enforced by the storage sessions themselves, so the
    /// response always reflects what was actually persisted: a write that
    /// misses the deadline is rolled back and reported as a timeout.
    pub async fn run_blocking<T, F>(&self, work: F) -> Result<T, AppError>
    where
        F: FnOnce(&CatalogService) -> Result<T, refcat_core::Error> + Send + 'static,
        T: Send + 'static,
    {
        let service = self.service.until(Instant::now() + self.config.request_timeout);

        match tokio::task::spawn_blocking(move || work(&service)).await {
            Ok(result) => result.map_err(AppError::from),
            Err(join_error) => Err(AppError::Internal(join_error.to_string())),
        }
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::routes())
        .merge(routes::mapping::routes())
        .merge(routes::catalog::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

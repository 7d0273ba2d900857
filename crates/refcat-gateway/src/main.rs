//! refcat HTTP/JSON gateway binary.

use clap::Parser;
use refcat_core::catalog::registry;
use refcat_core::{seed_demo, CatalogService, Store};
use refcat_gateway::{create_router, AppState, Args, GatewayConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line args
    let args = Args::parse();

    // Initialize tracing
    let log_filter = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "refcat_gateway={0},refcat_core={0},tower_http=info",
                    log_filter
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from(&args);
    info!(
        listen = %config.listen_addr,
        database = %config.database_path.display(),
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        "starting refcat gateway"
    );

    // Build the model registry before serving anything
    let build = registry::init();
    for reason in &build.rejected {
        warn!(error = %reason, "model will not be served");
    }
    if config.strict_schema && !build.is_complete() {
        anyhow::bail!(
            "{} declared model(s) failed schema checks",
            build.rejected.len()
        );
    }

    // Open the store and make sure every served table exists
    let store = Store::open(config.store_config())?;
    store.create_schema(&build.registry)?;

    let service = CatalogService::new(build.registry.clone(), store);
    if config.seed_demo {
        seed_demo(&service)?;
    }

    // Create application state and router
    let state = AppState::new(service, config.clone());
    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("gateway listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl+c");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}

use clap::Parser;
use refcat_upload::{serve, Args, Command, PushConfig, UploadConfig, Uploader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_filter = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("refcat_upload={},tower_http=info", log_filter).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &args.command {
        Command::Serve(serve_args) => {
            let config = UploadConfig::from(serve_args);
            serve(config, shutdown_signal()).await?;
            info!("upload server stopped");
        }
        Command::Push(push_args) => {
            let config = PushConfig::from(push_args);
            info!(
                url = %config.url,
                dir = %config.source_dir.display(),
                concurrency = config.concurrency,
                "pushing files"
            );

            let uploader = Uploader::new(&config)?;
            let report = uploader.upload_dir(&config.source_dir).await?;
            if !report.is_success() {
                anyhow::bail!(
                    "{} of {} uploads failed",
                    report.failed.len(),
                    report.total()
                );
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl+c");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}

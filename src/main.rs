use anyhow::Result;
use gp_bulk_export::{catalog, config, scheduler, server};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gp_bulk_export=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("Starting GlotPress bulk export service");

    // Load configuration from environment
    let config = Arc::new(config::Config::from_env()?);
    info!(
        "Export formats: {} (scratch root {})",
        config.export_formats.join(", "),
        config.export_root.display()
    );

    let source = catalog::connect(&config).await?;

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = scheduler::start_sweeper(&config).await?;

    server::serve(server::AppState { config, source }).await?;

    info!("Shut down cleanly");
    Ok(())
}

// Main entry point for the scrape dashboard API server

use std::sync::Arc;

use anyhow::{Context, Result};
use scrape_core::domains::scraping::actions::recover_orphaned_jobs;
use scrape_core::kernel::{store, ServerDeps, SimpleScraper, StreamHub};
use scrape_core::{server::build_app, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,scrape_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting scrape dashboard API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to the record store (runs migrations for direct Postgres)
    let store = store::connect(&config.store)
        .await
        .context("Failed to connect to record store")?;
    tracing::info!("Record store connected");

    let scraper = SimpleScraper::new(config.settings.scrape_timeout)
        .context("Failed to build HTTP scraper")?;

    let deps = ServerDeps::new(store, Arc::new(scraper), StreamHub::new(), config.settings);

    if config.recover_on_startup {
        let recovery_deps = deps.clone();
        tokio::spawn(async move {
            if let Err(e) = recover_orphaned_jobs(&recovery_deps).await {
                tracing::error!(error = %e, "Startup recovery failed");
            }
        });
    }

    // Drop hub channels nobody listens to anymore
    let hub = deps.stream_hub.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            ticker.tick().await;
            hub.cleanup().await;
        }
    });

    // Build application
    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

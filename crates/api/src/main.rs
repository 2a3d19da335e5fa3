use std::sync::Arc;

use anyhow::Context;

use praja_api::app::{self, AppServices};
use praja_infra::{NotificationWorker, PostgresCatalogStore, PrajaConfig, TracingSink};
use praja_stock::StockLedger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PrajaConfig::load().context("failed to load configuration")?;
    praja_observability::init(&config.log);

    let services = Arc::new(build_services(&config).await?);

    let worker = NotificationWorker::spawn(
        "notification-sink",
        services.ledger().subscribe(),
        TracingSink,
        config.notifications.poll_interval(),
    )
    .context("failed to start notification worker")?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app::build_app(services))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tokio::task::spawn_blocking(move || worker.shutdown()).await?;
    tracing::info!("shut down cleanly");
    Ok(())
}

async fn build_services(config: &PrajaConfig) -> anyhow::Result<AppServices> {
    let Some(url) = config.database.url.as_deref() else {
        tracing::warn!("database.url not set; starting with an empty in-memory ledger");
        return Ok(AppServices::new(StockLedger::new()));
    };

    let store = PostgresCatalogStore::connect(url)
        .await
        .context("failed to connect to the catalog database")?;
    let records = store.fetch_all().await.context("failed to load the catalog")?;
    tracing::info!(products = records.len(), "catalog loaded");

    Ok(AppServices::with_catalog(StockLedger::load(records), Arc::new(store)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use orbis_catalog::{
    CatalogService, GdpEstimator, HttpSourceFetcher, RefreshOrchestrator, SourceEndpoints,
    SummaryArtifact,
};
use orbis_core::Catalog;
use orbis_gateway::{App, AppState};
use orbis_storage::{InMemoryCatalog, MySqlCatalog};
use tokio::signal;
use tracing::info;

use crate::cli::{StorageBackendArg, CLI};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let config = CLI::try_parse()?;
    orbis_telemetry::init(config.log_format)?;

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        cache_dir = %config.cache_dir.display(),
        "starting gateway server"
    );

    match config.storage {
        StorageBackendArg::InMemory => run_server(config, InMemoryCatalog::new()).await,
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let catalog = MySqlCatalog::connect(mysql_dsn, config.mysql_max_connections).await?;
            catalog.ensure_schema().await?;
            run_server(config, catalog).await
        }
    }
}

async fn run_server<C: Catalog>(config: CLI, catalog: C) -> anyhow::Result<()> {
    let fetcher = HttpSourceFetcher::new(
        SourceEndpoints::builder()
            .countries_url(config.countries_url)
            .rates_url(config.rates_url)
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build(),
    )?;
    let estimator = GdpEstimator::new(config.gdp_multiplier_min, config.gdp_multiplier_max)?;

    let refresher = RefreshOrchestrator::builder()
        .catalog(Arc::new(catalog))
        .fetcher(fetcher)
        .artifact(SummaryArtifact::in_dir(&config.cache_dir))
        .estimator(estimator)
        .deadline(config.refresh_deadline_secs.map(Duration::from_secs))
        .build();
    let state = AppState::new(Arc::new(CatalogService::new(refresher)));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

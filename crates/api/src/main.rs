use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use building_manager_api::app::{create_app, onboarding_settings};
use building_manager_api::config::Config;
use building_manager_api::jobs::{recover_interrupted_sagas, JobScheduler, PoolMetricsJob};
use building_manager_api::middleware::{init_metrics, logging::init_logging};
use building_manager_api::services::{HostedIdentityClient, HostedStorageClient};
use domain::services::{BuildingStore, IdentityProvider, ObjectStorage, Onboarding};
use persistence::PgBuildingStore;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("loading configuration")?;
    init_logging(&config.logging).context("installing tracing subscriber")?;
    init_metrics().context("installing metrics recorder")?;

    info!("Starting Building Manager API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&persistence::db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    })
    .await
    .context("connecting to the database")?;
    persistence::db::run_migrations(&pool).await?;

    let store: Arc<dyn BuildingStore> = Arc::new(PgBuildingStore::new(pool.clone()));
    let identity: Arc<dyn IdentityProvider> = Arc::new(HostedIdentityClient::new(&config.identity)?);
    let storage: Arc<dyn ObjectStorage> = Arc::new(HostedStorageClient::new(&config.identity)?);

    if !config.identity.session_configured() {
        warn!("Identity provider URL or anon key missing; every request is anonymous");
    }
    if !identity.admin_configured() {
        warn!("Identity service key missing; admin onboarding is disabled");
    }

    if config.onboarding.recover_sagas_on_startup && identity.admin_configured() {
        let onboarding = Onboarding::new(
            store.as_ref(),
            identity.as_ref(),
            onboarding_settings(&config),
        );
        if let Err(e) = recover_interrupted_sagas(&onboarding).await {
            warn!(error = %e, "Saga recovery failed; continuing startup");
        }
    }

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool));
    scheduler.start();

    let addr = config.socket_addr()?;
    let app = create_app(config, store, identity, storage);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown(Duration::from_secs(5)).await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received");
}

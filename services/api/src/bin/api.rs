//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, MemorySessionCache},
    build_state,
    config::Config,
    error::ApiError,
    seed::seed_inventory,
    web::build_router,
    Stores,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    let stores = match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .acquire_timeout(config.database_acquire_timeout)
                .connect(url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Stores::postgres(db_adapter)
        }
        None => {
            warn!(
                "DATABASE_URL is not set; using the in-memory store. \
                 Data will not survive a restart."
            );
            Stores::memory()
        }
    };

    if config.seed_inventory {
        seed_inventory(stores.inventory.as_ref()).await?;
    }

    // --- 3. Start the Session Cache Sweeper ---
    let shutdown = CancellationToken::new();
    let session_cache = MemorySessionCache::new(config.session_ttl);
    if !session_cache.enabled() {
        warn!("SESSION_TTL_SECS is 0; every login will be refused.");
    }
    let sweeper = session_cache.spawn_sweeper(config.session_sweep_interval, shutdown.clone());

    // --- 4. Build the Shared AppState & Router ---
    let app_state = build_state(config.clone(), stores, session_cache);
    let app = build_router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for the shutdown signal");
            }
            info!("Shutdown signal received.");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Session sweeper ended abnormally");
    }
    info!("Server stopped.");
    Ok(())
}

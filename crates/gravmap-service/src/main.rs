//! Gravmap Service - HTTP API for gravity survey analysis
//!
//! This is the main entry point for the gravmap service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gravmap_service::{create_router, AppState, ServiceConfig};
use gravmap_store::{MemStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gravmap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gravmap Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        database_configured = %config.database_url.is_some(),
        token_ttl_minutes = %config.access_token_ttl_minutes,
        "Service configuration loaded"
    );

    let store = build_store(&config).await?;

    // Build app state and router
    let state = AppState::new(store, config.clone());
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Select the storage backend: PostgreSQL when `DATABASE_URL` is set,
/// otherwise the in-memory store.
async fn build_store(
    config: &ServiceConfig,
) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    if let Some(url) = &config.database_url {
        #[cfg(feature = "postgres-backend")]
        {
            tracing::info!("Connecting to PostgreSQL");
            let store = gravmap_store::PgStore::connect(url).await?;
            store.init_schema().await?;
            return Ok(Arc::new(store));
        }
        #[cfg(not(feature = "postgres-backend"))]
        {
            let _ = url;
            return Err(
                "DATABASE_URL is set but the service was built without postgres-backend".into(),
            );
        }
    }

    tracing::warn!("DATABASE_URL not set - using the in-memory store; data will not survive a restart");
    Ok(Arc::new(MemStore::new()))
}

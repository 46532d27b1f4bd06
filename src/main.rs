//! Seller Settlement Service - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Build the store (PostgreSQL pool + migrations, or in-memory)
//! 3. Register the bootstrap admin key, if configured
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use seller_settlement::{
    app::{self, AppState},
    config::{Config, StorageBackend},
    db,
    models::api_key::{ActorRole, IssueApiKeyRequest},
    services::admin_service,
    store::{MemoryStore, PgStore, Store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(backend = ?config.storage_backend, "Configuration loaded");

    let store: Arc<dyn Store> = match config.storage_backend {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres backend")?;

            let pool = db::create_pool(database_url, config.db_max_connections).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(raw_key) = config.bootstrap_admin_key.as_deref() {
        admin_service::register_api_key(
            store.as_ref(),
            raw_key,
            IssueApiKeyRequest {
                actor_id: "admin".to_string(),
                role: ActorRole::Admin,
                seller_id: None,
            },
        )
        .await?;
    }

    let app = app::router(AppState::new(store, config.policy()));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Startup sequence: pick the storage backend, migrate, build state, seed.

use anyhow::{Context, Result};
use log::{info, warn};
use std::sync::Arc;

use crate::core::bootstrap::seed_if_empty;
use crate::core::config::{AppConfig, StorageBackend};
use crate::core::shared::state::AppState;
use crate::storage::{MemoryStore, PgStore, Store};

pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>> {
    match config.database.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let url = config.database.url.clone();
            let pool_size = config.database.pool_size;
            // r2d2 connects eagerly while building the pool.
            let store = tokio::task::spawn_blocking(move || PgStore::connect(&url, pool_size))
                .await
                .context("Database connection task failed")?
                .context("Failed to connect to PostgreSQL")?;
            store
                .run_migrations()
                .await
                .context("Failed to apply migrations")?;
            info!("Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
    }
}

pub async fn init_app_state(config: AppConfig) -> Result<Arc<AppState>> {
    let store = open_store(&config).await?;
    let seed = config.seed.enabled;
    let state = AppState::new(store, config)?;

    if seed {
        seed_if_empty(&state).await.context("Failed to seed demo data")?;
    }

    Ok(Arc::new(state))
}

use std::sync::Arc;

use chrono::Duration;
use sqlx::postgres::PgPoolOptions;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::error::AppError;
use crate::store::{memory::MemoryStore, postgres::PgStore, Store};

/// Everything a handler needs, built once at startup and shared read-only.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt_secret: &str, token_ttl: Duration, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens: TokenIssuer::new(jwt_secret, token_ttl),
            bcrypt_cost,
        }
    }

    /// Connects the configured store (running migrations for Postgres) and builds the state.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let store: Arc<dyn Store> = if config.uses_memory_store() {
            log::warn!("Using the in-memory store; data will not survive a restart");
            Arc::new(MemoryStore::new())
        } else {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&config.database_url)
                .await?;
            let store = PgStore::new(pool);
            store.migrate().await?;
            log::info!("Connected to Postgres and applied migrations");
            Arc::new(store)
        };

        Ok(Self::new(
            store,
            &config.jwt_secret,
            Duration::hours(config.token_ttl_hours),
            config.bcrypt_cost,
        ))
    }
}

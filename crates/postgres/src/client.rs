//! Postgres pool wrapper.

use crate::config::PostgresConfig;
use engine_core::{Error, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Shared Postgres pool. Cheap to clone; safe for concurrent use by every worker.
#[derive(Clone)]
pub struct PostgresClient {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresClient {
    /// Creates the pool without connecting; connections open on first use.
    pub fn new(config: PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(&config.url)
            .map_err(|e| Error::config(format!("invalid postgres url: {}", e)))?;

        info!(pool_size = config.pool_size, "Created Postgres pool");

        Ok(Self { pool, config })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }
}

//! Postgres health checks.

use crate::client::PostgresClient;
use engine_core::{Error, Result};
use tracing::{debug, error};

/// Check Postgres connection health.
pub async fn check_connection(client: &PostgresClient) -> bool {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(client.pool())
        .await
    {
        Ok(_) => {
            debug!("Postgres connection healthy");
            true
        }
        Err(e) => {
            error!("Postgres health check failed: {}", e);
            false
        }
    }
}

/// Create the tables the pipeline writes to, if missing.
pub async fn init_schema(client: &PostgresClient) -> Result<()> {
    use crate::schema::all_tables;

    for ddl in all_tables() {
        sqlx::query(ddl)
            .execute(client.pool())
            .await
            .map_err(|e| Error::internal(format!("Failed to execute DDL: {}", e)))?;
    }

    debug!("Postgres schema initialized");
    Ok(())
}

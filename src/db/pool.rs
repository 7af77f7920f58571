use crate::{config::DatabaseConfig, errors::Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Pool shared by the user and note repositories.
///
/// `min_connections` are opened eagerly so the first requests after startup
/// do not pay for connection setup; idle connections above that floor are
/// closed after `idle_timeout_seconds`.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect(&config.url)
        .await?;

    tracing::info!(
        min_connections = config.min_connections,
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout_seconds,
        "Notes database pool ready"
    );

    Ok(pool)
}

/// Create the `users` and `notes` tables and their indexes if missing
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./src/db/migrations").run(pool).await?;
    tracing::info!("Notes schema is up to date");
    Ok(())
}

/// Round-trip used by the readiness probe
pub async fn health_check(pool: &PgPool) -> Result<()> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if one != 1 {
        return Err(crate::errors::AppError::Internal(
            "Unexpected database health check result".to_string(),
        ));
    }
    Ok(())
}

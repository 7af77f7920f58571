use crate::{config::CacheConfig, errors::{AppError, Result}};
use redis::{aio::ConnectionManager, Client};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a Redis client and connection manager
pub async fn create_client(config: &CacheConfig) -> Result<ConnectionManager> {
    tracing::info!("Creating Redis client");

    let client = Client::open(config.url.as_str())?;

    let manager = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
        .await
        .map_err(|_| AppError::Internal("Timed out connecting to Redis".to_string()))??;

    tracing::info!("Redis client connected");

    Ok(manager)
}

/// Health check for Redis connection
pub async fn health_check(manager: &mut ConnectionManager) -> Result<()> {
    redis::cmd("PING").query_async::<_, String>(manager).await?;
    Ok(())
}

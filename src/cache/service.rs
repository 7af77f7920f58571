// JSON response cache on top of Redis

use crate::cache::{client, keys};
use crate::config::CacheConfig;
use crate::errors::{AppError, Result};
use crate::observability::MetricsRecorder;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;

/// Upper bound for a single cache round trip before it counts as failed
const OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct CacheService {
    manager: ConnectionManager,
    default_ttl: Duration,
}

impl CacheService {
    pub fn new(manager: ConnectionManager, default_ttl: Duration) -> Self {
        Self {
            manager,
            default_ttl,
        }
    }

    /// Connect using the cache section of the configuration
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let manager = client::create_client(config).await?;
        Ok(Self::new(manager, config.ttl()))
    }

    async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(OPERATION_TIMEOUT, op)
            .await
            .map_err(|_| AppError::Internal("Cache operation timed out".to_string()))?
    }

    /// Fetch and decode a cached value
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.manager.clone();
        let raw = self
            .bounded(async { Ok(conn.get::<_, Option<String>>(key).await?) })
            .await?;

        raw.map(|payload| serde_json::from_str(&payload))
            .transpose()
            .map_err(|e| AppError::Internal(format!("Corrupt cache entry {}: {}", key, e)))
    }

    /// Store a value as JSON; `None` uses the configured default TTL
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let payload = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("Failed to encode cache entry: {}", e)))?;
        let seconds = ttl.unwrap_or(self.default_ttl).as_secs().max(1);

        let mut conn = self.manager.clone();
        self.bounded(async {
            conn.set_ex::<_, _, ()>(key, payload, seconds).await?;
            Ok(())
        })
        .await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        self.bounded(async {
            conn.del::<_, ()>(key).await?;
            Ok(())
        })
        .await
    }

    /// Remove every key matching a glob pattern, returning how many went
    pub async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.manager.clone();
        self.bounded(async {
            let matched: Vec<String> = conn.keys(pattern).await?;
            if matched.is_empty() {
                return Ok(0);
            }
            conn.del::<_, ()>(&matched).await?;
            Ok(matched.len())
        })
        .await
    }

    /// Drop every cached list, detail and category view of one user.
    /// Individual pattern failures are logged and skipped.
    pub async fn invalidate_user_notes(&self, user_id: i64) {
        for pattern in keys::user_patterns(user_id) {
            if let Err(e) = self.delete_pattern(&pattern).await {
                tracing::warn!(pattern = %pattern, error = %e, "Failed to delete cache pattern");
            }
        }
        tracing::debug!(user_id, "Invalidated note cache");
    }

    /// Cached read that never fails: errors count as misses
    pub async fn lookup<T: DeserializeOwned>(&self, resource: &str, key: &str) -> Option<T> {
        match self.get(key).await {
            Ok(Some(value)) => {
                tracing::debug!(key = %key, "Cache hit");
                MetricsRecorder::record_cache_lookup(resource, "hit");
                Some(value)
            }
            Ok(None) => {
                MetricsRecorder::record_cache_lookup(resource, "miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed");
                MetricsRecorder::record_cache_lookup(resource, "error");
                None
            }
        }
    }

    /// Best-effort write with the default TTL
    pub async fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.set(key, value, None).await {
            tracing::warn!(key = %key, error = %e, "Failed to cache response");
        }
    }

    pub async fn health(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        self.bounded(client::health_check(&mut conn)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connect() -> CacheService {
        let config = CacheConfig {
            enabled: true,
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379/15".to_string()),
            ttl_seconds: 60,
        };
        CacheService::connect(&config).await.unwrap()
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_set_get_delete() {
        let cache = connect().await;
        let key = keys::categories(-1);

        cache.set(&key, &vec!["work", "home"], None).await.unwrap();
        let cached: Option<Vec<String>> = cache.get(&key).await.unwrap();
        assert_eq!(cached, Some(vec!["work".to_string(), "home".to_string()]));

        cache.delete(&key).await.unwrap();
        let cached: Option<Vec<String>> = cache.get(&key).await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_invalidate_user_notes() {
        let cache = connect().await;
        let list = keys::notes_list(-2, None, 1, 10);
        let detail = keys::note_detail(9, -2);
        let other_user = keys::note_detail(9, -3);

        for key in [&list, &detail, &other_user] {
            cache.set(key, &"cached", None).await.unwrap();
        }

        cache.invalidate_user_notes(-2).await;

        assert!(cache.get::<String>(&list).await.unwrap().is_none());
        assert!(cache.get::<String>(&detail).await.unwrap().is_none());
        assert!(cache.get::<String>(&other_user).await.unwrap().is_some());

        cache.delete(&other_user).await.unwrap();
    }
}

use crate::cache::CacheService;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

pub const SERVICE_NAME: &str = "daily-notes-api";

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    /// `disabled`, `healthy` or `error`
    pub cache: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_error: Option<String>,
}

/// Body of `GET /health/ready`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessStatus {
    pub status: String,
    pub version: String,
    pub checks: ReadinessChecks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessChecks {
    pub database: ComponentStatus,
    pub cache: ComponentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }

    fn disabled() -> Self {
        Self {
            status: "disabled".to_string(),
            message: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message),
        }
    }

    /// A disabled cache does not make the service unready
    fn is_usable(&self) -> bool {
        self.status != "error"
    }
}

pub struct HealthChecker {
    db_pool: PgPool,
    cache: Option<CacheService>,
}

impl HealthChecker {
    pub fn new(db_pool: PgPool, cache: Option<CacheService>) -> Self {
        Self { db_pool, cache }
    }

    /// Liveness plus cache state. Always reports `ok`; a failing cache only
    /// changes the `cache` field.
    pub async fn liveness(&self) -> HealthStatus {
        let (cache, cache_error) = match &self.cache {
            None => ("disabled", None),
            Some(cache) => match cache.health().await {
                Ok(()) => ("healthy", None),
                Err(e) => ("error", Some(e.to_string())),
            },
        };

        HealthStatus {
            status: "ok".to_string(),
            service: SERVICE_NAME.to_string(),
            cache: cache.to_string(),
            cache_error,
        }
    }

    /// Readiness check - can the service handle requests?
    pub async fn readiness(&self) -> ReadinessStatus {
        let database = self.check_database().await;
        let cache = self.check_cache().await;

        let status = if database.is_usable() && cache.is_usable() {
            "ok"
        } else {
            "degraded"
        };

        ReadinessStatus {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks: ReadinessChecks { database, cache },
        }
    }

    async fn check_database(&self) -> ComponentStatus {
        match crate::db::health_check(&self.db_pool).await {
            Ok(()) => ComponentStatus::ok(),
            Err(e) => ComponentStatus::error(format!("Database check failed: {}", e)),
        }
    }

    async fn check_cache(&self) -> ComponentStatus {
        match &self.cache {
            None => ComponentStatus::disabled(),
            Some(cache) => match cache.health().await {
                Ok(()) => ComponentStatus::ok(),
                Err(e) => ComponentStatus::error(format!("Cache check failed: {}", e)),
            },
        }
    }
}

use crate::errors::{AppError, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub cache: CacheConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiration_hours: i64,
    pub password_min_length: usize,
}

// Keeps the signing secret out of startup logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("password_min_length", &self.password_min_length)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Applied to login and registration
    pub auth: WindowLimitConfig,
    /// Applied to every authenticated route
    pub general: WindowLimitConfig,
}

/// Settings for one sliding-window limiter
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WindowLimitConfig {
    pub requests: u32,
    pub window_seconds: u64,
    pub cleanup_seconds: u64,
}

impl WindowLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn cleanup(&self) -> Duration {
        Duration::from_secs(self.cleanup_seconds)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.requests == 0 {
            return Err(AppError::Configuration(format!(
                "rate_limit.{}.requests must be greater than zero",
                name
            )));
        }
        if self.window_seconds == 0 {
            return Err(AppError::Configuration(format!(
                "rate_limit.{}.window_seconds must be greater than zero",
                name
            )));
        }
        if self.cleanup_seconds < self.window_seconds {
            return Err(AppError::Configuration(format!(
                "rate_limit.{}.cleanup_seconds must not be shorter than the window",
                name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub url: String,
    pub ttl_seconds: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let environment = env::var("NOTES_API_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(
                config::File::with_name(&format!("config/{}", environment)).required(false),
            )
            // e.g., NOTES_API__RATE_LIMIT__AUTH__REQUESTS=10
            .add_source(
                config::Environment::with_prefix("NOTES_API")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Configuration(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Configuration("Invalid port number".to_string()));
        }

        if self.database.url.is_empty() {
            return Err(AppError::Configuration(
                "Database URL is required".to_string(),
            ));
        }

        if self.auth.jwt_secret.len() < 32 {
            return Err(AppError::Configuration(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        if self.auth.jwt_expiration_hours <= 0 {
            return Err(AppError::Configuration(
                "JWT expiration must be positive".to_string(),
            ));
        }

        if self.auth.password_min_length < 8 {
            return Err(AppError::Configuration(
                "Password min length must be at least 8".to_string(),
            ));
        }

        self.rate_limit.auth.validate("auth")?;
        self.rate_limit.general.validate("general")?;

        if self.cache.enabled && self.cache.url.is_empty() {
            return Err(AppError::Configuration(
                "Cache URL is required when caching is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = Config::load().expect("Failed to load config");
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_auth_rate_limit() {
        let config = Config::load().expect("Failed to load config");
        let auth = config.rate_limit.auth;
        assert_eq!(auth.requests, 5);
        assert_eq!(auth.window(), Duration::from_secs(15 * 60));
        assert_eq!(auth.cleanup(), Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_cleanup_shorter_than_window_rejected() {
        let mut config = Config::load().expect("Failed to load config");
        config.rate_limit.auth.cleanup_seconds = config.rate_limit.auth.window_seconds - 1;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_zero_requests_rejected() {
        let mut config = Config::load().expect("Failed to load config");
        config.rate_limit.general.requests = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::load().expect("Failed to load config");
        let rendered = format!("{:?}", config.auth);
        assert!(!rendered.contains(&config.auth.jwt_secret));
    }
}

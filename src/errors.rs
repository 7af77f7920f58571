use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// A single field-level validation failure, reported in the `errors` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Application-wide error type
#[derive(Debug)]
pub enum AppError {
    // Database errors
    Database(sqlx::Error),
    DatabaseMigration(sqlx::migrate::MigrateError),

    // Cache errors
    Cache(redis::RedisError),

    // Authentication errors
    InvalidCredentials,
    TokenGeneration(String),
    TokenValidation(String),
    TokenExpired,
    Unauthorized(String),

    // Resource errors
    NotFound(String),
    Conflict(String),

    // Request errors
    BadRequest(String),
    Validation(Vec<FieldError>),

    // Rate limiting
    RateLimited {
        limit: u32,
        retry_after: u64,
        reset: i64,
    },

    // Configuration errors
    Configuration(String),

    // Cryptographic errors
    Cryptographic(String),

    // Internal errors
    Internal(String),
}

impl AppError {
    /// Shorthand for a validation failure on a single field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::DatabaseMigration(e) => write!(f, "Database migration error: {}", e),
            AppError::Cache(e) => write!(f, "Cache error: {}", e),
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::TokenGeneration(msg) => write!(f, "Token generation failed: {}", msg),
            AppError::TokenValidation(msg) => write!(f, "Token validation failed: {}", msg),
            AppError::TokenExpired => write!(f, "Token has expired"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Validation(errors) => {
                write!(f, "Validation failed on {} field(s)", errors.len())
            }
            AppError::RateLimited { retry_after, .. } => {
                write!(f, "Rate limit exceeded, retry after {}s", retry_after)
            }
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Cryptographic(msg) => write!(f, "Cryptographic error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Convert from various error types
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseMigration(err)
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            ErrorKind::InvalidToken => AppError::TokenValidation("Invalid token".to_string()),
            _ => AppError::TokenValidation(err.to_string()),
        }
    }
}

impl From<crate::rate_limit::LimiterConfigError> for AppError {
    fn from(err: crate::rate_limit::LimiterConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

fn internal(kind: &str, err: &AppError) -> (StatusCode, String, Option<Value>) {
    tracing::error!("{} error: {:?}", kind, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
        None,
    )
}

// Implement IntoResponse for Axum
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match &self {
            AppError::Database(_) | AppError::DatabaseMigration(_) => internal("Database", &self),
            AppError::Cache(_) => internal("Cache", &self),
            AppError::TokenGeneration(_) => internal("Token generation", &self),
            AppError::Configuration(_) => internal("Configuration", &self),
            AppError::Cryptographic(_) => internal("Cryptographic", &self),
            AppError::Internal(_) => internal("Internal", &self),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
                None,
            ),
            AppError::TokenValidation(_) | AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token".to_string(),
                None,
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                Some(json!(errors)),
            ),
            AppError::RateLimited {
                limit,
                retry_after,
                reset,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later".to_string(),
                Some(json!({
                    "retry_after": retry_after,
                    "limit": limit,
                    "reset": reset,
                })),
            ),
        };

        let mut body = json!({
            "success": false,
            "message": message,
        });
        if let Some(errors) = errors {
            body["errors"] = errors;
        }

        let mut response = (status, Json(body)).into_response();

        if let AppError::RateLimited { retry_after, .. } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

// Database queries for user accounts

use crate::db::schema::User;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sqlx::PgPool;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, full_name, created_at, updated_at";

/// Account storage used by the auth and profile handlers
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; `password_hash` must already be hashed
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<User>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Returns `None` when the user no longer exists
    async fn update_profile(&self, id: i64, full_name: &str, email: &str) -> Result<Option<User>>;

    /// Returns `false` when the user no longer exists
    async fn change_password(&self, id: i64, password_hash: &str) -> Result<bool>;

    async fn username_exists(&self, username: &str) -> Result<bool>;

    async fn email_exists(&self, email: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn exists(&self, column: &str, value: &str) -> Result<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM users WHERE {} = $1)", column);
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

/// Map a unique-constraint violation to a conflict on the offending column
fn unique_violation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some(c) if c.contains("username") => "Username already exists",
                _ => "Email already exists",
            };
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::Database(err)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, full_name) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .bind(full_name)
            .fetch_one(&self.pool)
            .await
            .map_err(unique_violation)?;

        tracing::debug!(user_id = user.id, "Created user");
        Ok(user)
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_one_by("username", username).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_one_by("email", email).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_profile(&self, id: i64, full_name: &str, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET full_name = $1, email = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(full_name)
            .bind(email)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unique_violation)?;
        Ok(user)
    }

    async fn change_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = id, "Changed password");
        Ok(result.rows_affected() > 0)
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        self.exists("username", username).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        self.exists("email", email).await
    }
}

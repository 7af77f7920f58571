// Registration and login endpoints

use crate::api::{extract::JsonBody, response, routes::AppState};
use crate::auth::password;
use crate::db::schema::UserResponse;
use crate::domain::{LoginRequest, RegisterRequest};
use crate::errors::{AppError, Result};
use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<Response> {
    let new_user = req.validate(state.password_min_length)?;

    if state.users.username_exists(&new_user.username).await? {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    if state.users.email_exists(&new_user.email).await? {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password_blocking(new_user.password).await?;
    let user = state
        .users
        .create(
            &new_user.username,
            &new_user.email,
            &password_hash,
            &new_user.full_name,
        )
        .await?;

    let token = state.jwt.generate_token(user.id, &user.username)?;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok(response::created(AuthResponse {
        user: user.to_response(),
        token,
    }))
}

/// POST /api/v1/auth/login
///
/// Unknown usernames and wrong passwords get the same 401.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Response> {
    let credentials = req.validate()?;

    let user = state
        .users
        .get_by_username(&credentials.username)
        .await?
        .ok_or_else(|| {
            tracing::warn!(username = %credentials.username, "Login attempt for unknown user");
            AppError::InvalidCredentials
        })?;

    let valid =
        password::verify_password_blocking(credentials.password, user.password_hash.clone())
            .await?;
    if !valid {
        tracing::warn!(user_id = user.id, "Invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.jwt.generate_token(user.id, &user.username)?;
    tracing::info!(user_id = user.id, "Successful login");

    Ok(response::success(AuthResponse {
        user: user.to_response(),
        token,
    }))
}

// Profile endpoints for the authenticated user

use crate::api::{extract::JsonBody, response, routes::AppState};
use crate::auth::{password, AuthUser};
use crate::domain::{ChangePasswordRequest, UpdateProfileRequest};
use crate::errors::{AppError, Result};
use axum::{extract::State, response::Response};
use serde_json::json;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// GET /api/v1/user/profile
pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Response> {
    let user = state
        .users
        .get_by_id(auth.id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(response::success(user.to_response()))
}

/// PUT /api/v1/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<Response> {
    let update = req.validate()?;

    // Keeping one's own address is not a conflict
    if let Some(owner) = state.users.get_by_email(&update.email).await? {
        if owner.id != auth.id {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
    }

    let user = state
        .users
        .update_profile(auth.id, &update.full_name, &update.email)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = user.id, "Profile updated");
    Ok(response::success(user.to_response()))
}

/// POST /api/v1/user/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<Response> {
    let change = req.validate(state.password_min_length)?;

    let user = state
        .users
        .get_by_id(auth.id)
        .await?
        .ok_or_else(user_not_found)?;

    let current_ok =
        password::verify_password_blocking(change.current_password, user.password_hash).await?;
    if !current_ok {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = password::hash_password_blocking(change.new_password).await?;
    if !state.users.change_password(auth.id, &new_hash).await? {
        return Err(user_not_found());
    }

    tracing::info!(user_id = auth.id, "Password changed");
    Ok(response::success(json!({
        "message": "Password changed successfully"
    })))
}

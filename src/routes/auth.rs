// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: register, login and profile.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::ApiResponse;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Preferences, PreferencesUpdate, PublicUser};
use crate::services::AuthSession;
use crate::AppState;

/// Public account routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

/// Profile routes. The auth middleware is applied in routes/mod.rs.
pub fn profile_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/profile", get(get_profile).put(update_profile))
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub preferences: Option<Preferences>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdateRequest {
    pub preferences: PreferencesUpdate,
}

#[derive(Serialize)]
pub struct UserData {
    pub user: PublicUser,
}

async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthSession>>> {
    let Json(req) = payload?;
    req.validate()?;

    let session = state
        .accounts
        .register(req.email.trim(), &req.password, req.preferences)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "User registered successfully",
        session,
    )))
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthSession>>> {
    let Json(req) = payload?;
    req.validate()?;

    let session = state.accounts.login(req.email.trim(), &req.password).await?;

    Ok(Json(ApiResponse::with_message("Login successful", session)))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserData>>> {
    let user = state.accounts.profile(&user.user_id).await?;
    Ok(Json(ApiResponse::ok(UserData { user })))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UserData>>> {
    let Json(req) = payload?;

    let user = state
        .accounts
        .update_preferences(&user.user_id, req.preferences)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Profile updated successfully",
        UserData { user },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_requires_email_and_password() {
        let req: RegisterRequest = serde_json::from_str("{}").unwrap();
        let err = crate::error::AppError::from(req.validate().unwrap_err());
        let msg = err.to_string();
        assert!(msg.contains("A valid email is required"));
        assert!(msg.contains("Password is required"));
    }

    #[test]
    fn test_login_errors_collapse_to_one_message() {
        let req: LoginRequest = serde_json::from_str("{}").unwrap();
        let err = crate::error::AppError::from(req.validate().unwrap_err());
        assert_eq!(err.to_string(), "Email and password are required");
    }
}

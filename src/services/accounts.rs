// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account service: registration, login, profile and preferences.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::auth::create_jwt;
use crate::models::{Preferences, PreferencesUpdate, PublicUser, User};
use crate::services::password::{decoy_hash, hash_password, verify_password};

/// User plus a freshly issued bearer token.
#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub user: PublicUser,
    pub token: String,
}

/// Issues credentials and manages user records.
pub struct AccountService {
    store: Arc<dyn Store>,
    signing_key: Vec<u8>,
    password_iterations: u32,
    /// Checked on logins for unknown emails so they take as long as a wrong
    /// password.
    decoy_hash: String,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, signing_key: Vec<u8>, password_iterations: u32) -> Self {
        Self {
            store,
            signing_key,
            password_iterations,
            decoy_hash: decoy_hash(password_iterations),
        }
    }

    /// Create a user. A duplicate email is rejected before anything is
    /// hashed or written, so the existing account is untouched.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        preferences: Option<Preferences>,
    ) -> Result<AuthSession> {
        if self.store.find_user_by_email(email).await?.is_some() {
            tracing::info!("Registration rejected: email already registered");
            return Err(AppError::UserExists);
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: hash_password(password, self.password_iterations)?,
            preferences: preferences.unwrap_or_default(),
            created_at: Utc::now(),
        };

        self.store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, "User registered");

        self.session_for(&user)
    }

    /// Authenticate with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            verify_password(password, &self.decoy_hash);
            tracing::info!("Login rejected: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash) {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.session_for(&user)
    }

    pub async fn profile(&self, user_id: &str) -> Result<PublicUser> {
        let user = self.load(user_id).await?;
        Ok(PublicUser::from(&user))
    }

    /// Shallow-merge `update` into the user's stored preferences.
    pub async fn update_preferences(
        &self,
        user_id: &str,
        update: PreferencesUpdate,
    ) -> Result<PublicUser> {
        let mut user = self.load(user_id).await?;
        update.apply(&mut user.preferences);
        self.store.update_user(&user).await?;

        tracing::debug!(user_id, "Preferences updated");
        Ok(PublicUser::from(&user))
    }

    async fn load(&self, user_id: &str) -> Result<User> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        let token = create_jwt(&user.id, &self.signing_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
        Ok(AuthSession {
            user: PublicUser::from(user),
            token,
        })
    }
}

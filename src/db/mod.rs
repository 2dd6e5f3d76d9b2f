// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Services depend on the [`Store`] trait; [`MemoryStore`] backs tests and
//! local development, [`FirestoreDb`] backs production.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{TimeLog, TimeLogFilter, User};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TIME_LOGS: &str = "time_logs";
}

/// Storage capability needed by the account and report services.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new user. Fails with [`AppError::UserExists`] if the email
    /// is already registered.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Overwrite an existing user record (matched by id).
    async fn update_user(&self, user: &User) -> Result<(), AppError>;

    async fn insert_time_log(&self, log: &TimeLog) -> Result<(), AppError>;

    /// A user's logs with `start <= date < end`, oldest first.
    async fn time_logs_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeLog>, AppError>;

    /// One page of a user's logs matching `filter`, newest first, plus the
    /// total number of matches.
    async fn list_time_logs(
        &self,
        user_id: &str,
        filter: &TimeLogFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<TimeLog>, u64), AppError>;

    /// Delete one of the user's logs. Returns `false` if no such log is
    /// owned by `user_id`.
    async fn delete_time_log(&self, user_id: &str, id: &str) -> Result<bool, AppError>;
}

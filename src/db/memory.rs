// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent maps.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::db::Store;
use crate::error::AppError;
use crate::models::{TimeLog, TimeLogFilter, User};

/// Store that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    /// Users keyed by id
    users: DashMap<String, User>,
    /// Email -> user id
    emails: DashMap<String, String>,
    /// User id -> logs in insertion order
    time_logs: DashMap<String, Vec<TimeLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::UserExists),
            Entry::Vacant(slot) => {
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(())
            }
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.emails.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        match self.users.get_mut(&user.id) {
            Some(mut existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }

    async fn insert_time_log(&self, log: &TimeLog) -> Result<(), AppError> {
        self.time_logs
            .entry(log.user_id.clone())
            .or_default()
            .push(log.clone());
        Ok(())
    }

    async fn time_logs_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeLog>, AppError> {
        let mut logs: Vec<TimeLog> = self
            .time_logs
            .get(user_id)
            .map(|logs| {
                logs.iter()
                    .filter(|l| l.date >= start && l.date < end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        logs.sort_by_key(|l| l.date);
        Ok(logs)
    }

    async fn list_time_logs(
        &self,
        user_id: &str,
        filter: &TimeLogFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<TimeLog>, u64), AppError> {
        let mut matching: Vec<TimeLog> = self
            .time_logs
            .get(user_id)
            .map(|logs| logs.iter().filter(|l| filter.matches(l)).cloned().collect())
            .unwrap_or_default();
        matching.sort_by(|a, b| b.date.cmp(&a.date));

        let total = matching.len() as u64;
        let page = matching.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn delete_time_log(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        let Some(mut logs) = self.time_logs.get_mut(user_id) else {
            return Ok(false);
        };
        let before = logs.len();
        logs.retain(|l| l.id != id);
        Ok(logs.len() != before)
    }
}

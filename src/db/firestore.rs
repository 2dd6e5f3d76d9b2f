// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`Store`].
//!
//! Collections:
//! - `users` (document ID = user id)
//! - `time_logs` (document ID = log id; `date_ms` carries the event time
//!   as epoch milliseconds for range queries)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{collections, Store};
use crate::error::AppError;
use crate::models::{TimeLog, TimeLogFilter, User};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Stored shape of a [`TimeLog`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimeLogDocument {
    id: String,
    user_id: String,
    site: String,
    hostname: String,
    time_spent: u64,
    title: String,
    url: String,
    date_ms: i64,
    created_at_ms: i64,
}

impl From<&TimeLog> for TimeLogDocument {
    fn from(log: &TimeLog) -> Self {
        Self {
            id: log.id.clone(),
            user_id: log.user_id.clone(),
            site: log.site.clone(),
            hostname: log.hostname.clone(),
            time_spent: log.time_spent,
            title: log.title.clone(),
            url: log.url.clone(),
            date_ms: log.date.timestamp_millis(),
            created_at_ms: log.created_at.timestamp_millis(),
        }
    }
}

impl TimeLogDocument {
    fn into_time_log(self) -> Result<TimeLog, AppError> {
        let to_utc = |ms: i64| {
            DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| {
                AppError::Database(format!("Invalid timestamp {} in time log {}", ms, self.id))
            })
        };
        let date = to_utc(self.date_ms)?;
        let created_at = to_utc(self.created_at_ms)?;

        Ok(TimeLog {
            id: self.id,
            user_id: self.user_id,
            site: self.site,
            hostname: self.hostname,
            time_spent: self.time_spent,
            title: self.title,
            url: self.url,
            date,
            created_at,
        })
    }
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator rejects real credentials, so skip the auth lookup.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn get_time_log_document(&self, id: &str) -> Result<Option<TimeLogDocument>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TIME_LOGS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    // The email check and the write are separate round trips, so two
    // concurrent registrations for one email can both pass.
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        if self.find_user_by_email(&user.email).await?.is_some() {
            return Err(AppError::UserExists);
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(user_id = %user.id, "Stored new user");
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Time Log Operations ─────────────────────────────────────

    async fn insert_time_log(&self, log: &TimeLog) -> Result<(), AppError> {
        let doc = TimeLogDocument::from(log);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TIME_LOGS)
            .document_id(&doc.id)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn time_logs_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeLog>, AppError> {
        let user_id = user_id.to_string();
        let start_ms = start.timestamp_millis();
        let end_ms = end.timestamp_millis();

        let docs: Vec<TimeLogDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TIME_LOGS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("date_ms").greater_than_or_equal(start_ms),
                    q.field("date_ms").less_than(end_ms),
                ])
            })
            .order_by([("date_ms", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        docs.into_iter().map(TimeLogDocument::into_time_log).collect()
    }

    async fn list_time_logs(
        &self,
        user_id: &str,
        filter: &TimeLogFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<TimeLog>, u64), AppError> {
        let user_id = user_id.to_string();
        let hostname = filter.hostname.clone();
        let start_ms = filter.start.map(|s| s.timestamp_millis());
        let end_ms = filter.end.map(|e| e.timestamp_millis());

        // Per-user log counts are small; count and page in memory.
        let docs: Vec<TimeLogDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TIME_LOGS)
            .filter(move |q| {
                let mut conditions = vec![q.field("user_id").eq(user_id.clone())];
                if let Some(hostname) = &hostname {
                    conditions.push(q.field("hostname").eq(hostname.clone()));
                }
                if let Some(start_ms) = start_ms {
                    conditions.push(q.field("date_ms").greater_than_or_equal(start_ms));
                }
                if let Some(end_ms) = end_ms {
                    conditions.push(q.field("date_ms").less_than_or_equal(end_ms));
                }
                q.for_all(conditions)
            })
            .order_by([("date_ms", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let total = docs.len() as u64;
        let page = docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(TimeLogDocument::into_time_log)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((page, total))
    }

    async fn delete_time_log(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        match self.get_time_log_document(id).await? {
            Some(doc) if doc.user_id == user_id => {}
            _ => return Ok(false),
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TIME_LOGS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(user_id, log_id = id, "Deleted time log");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_round_trip_keeps_millis() {
        let date = DateTime::<Utc>::from_timestamp_millis(1_704_103_200_123).unwrap();
        let log = TimeLog {
            id: "l1".into(),
            user_id: "u1".into(),
            site: "Docs".into(),
            hostname: "docs.rs".into(),
            time_spent: 5_000,
            title: "Docs".into(),
            url: "https://docs.rs".into(),
            date,
            created_at: date,
        };

        let doc = TimeLogDocument::from(&log);
        assert_eq!(doc.date_ms, 1_704_103_200_123);

        let back = doc.into_time_log().unwrap();
        assert_eq!(back.date, date);
        assert_eq!(back.hostname, "docs.rs");
    }

    #[tokio::test]
    async fn test_offline_client_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let err = db.find_user_by_id("u1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend sync client.
//!
//! Every sample becomes one `POST /api/timelog`. Nothing is queued or
//! retried: a failed push is logged and the sample stays local only.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::format_duration;
use crate::time_utils::format_utc_rfc3339;

/// A flushed or closed span of focus on one hostname.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSample {
    pub hostname: String,
    pub url: String,
    pub title: String,
    pub duration_ms: u64,
    pub captured_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeLogPayload<'a> {
    site: &'a str,
    hostname: &'a str,
    time_spent: u64,
    title: &'a str,
    url: &'a str,
    date: String,
}

impl<'a> From<&'a TimeSample> for TimeLogPayload<'a> {
    fn from(sample: &'a TimeSample) -> Self {
        let site = if sample.title.is_empty() {
            sample.hostname.as_str()
        } else {
            sample.title.as_str()
        };
        Self {
            site,
            hostname: &sample.hostname,
            time_spent: sample.duration_ms,
            title: &sample.title,
            url: &sample.url,
            date: format_utc_rfc3339(sample.captured_at),
        }
    }
}

/// What happened to a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No credentials; local-only mode.
    Skipped,
    Synced,
    /// The server rejected the token; the caller should evict it.
    Unauthorized,
    /// Any other failure. The sample is dropped.
    Failed,
}

#[derive(Clone)]
pub struct SyncClient {
    http: reqwest::Client,
    base_url: String,
}

impl SyncClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Push one sample.
    pub async fn push(&self, token: Option<&str>, sample: &TimeSample) -> SyncOutcome {
        let Some(token) = token else {
            tracing::debug!(hostname = %sample.hostname, "No auth token, skipping backend sync");
            return SyncOutcome::Skipped;
        };

        let url = format!("{}/api/timelog", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&TimeLogPayload::from(sample))
            .send()
            .await;

        let outcome = classify(response);
        match outcome {
            SyncOutcome::Synced => tracing::debug!(
                hostname = %sample.hostname,
                duration = %format_duration(sample.duration_ms),
                "Time sample synced"
            ),
            SyncOutcome::Unauthorized => {
                tracing::warn!("Server rejected auth token while syncing")
            }
            _ => tracing::warn!(hostname = %sample.hostname, "Time sample dropped"),
        }
        outcome
    }

    /// Call `GET /api/auth/profile` with `token`.
    pub async fn check_connection(&self, token: &str) -> SyncOutcome {
        let url = format!("{}/api/auth/profile", self.base_url);
        let response = self.http.get(&url).bearer_auth(token).send().await;
        classify(response)
    }
}

fn classify(response: reqwest::Result<reqwest::Response>) -> SyncOutcome {
    match response {
        Ok(r) if r.status().is_success() => SyncOutcome::Synced,
        Ok(r) if r.status() == reqwest::StatusCode::UNAUTHORIZED => SyncOutcome::Unauthorized,
        Ok(r) => {
            tracing::warn!(status = %r.status(), "Backend returned an error");
            SyncOutcome::Failed
        }
        Err(e) => {
            tracing::warn!(error = %e, "Backend request failed");
            SyncOutcome::Failed
        }
    }
}

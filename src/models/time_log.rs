// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time log events pushed by the extension.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One synced time sample. Append-only: never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeLog {
    /// UUID (also used as document ID)
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Display label (tab title, or hostname when untitled)
    pub site: String,
    /// Aggregation key
    pub hostname: String,
    /// Milliseconds
    pub time_spent: u64,
    pub title: String,
    pub url: String,
    /// When the time was spent
    pub date: DateTime<Utc>,
    /// When the server stored it
    pub created_at: DateTime<Utc>,
}

impl TimeLog {
    /// Duration in whole minutes, rounded to nearest.
    pub fn time_in_minutes(&self) -> u64 {
        (self.time_spent as f64 / 60_000.0).round() as u64
    }

    /// Duration in hours, rounded to two decimals.
    pub fn time_in_hours(&self) -> f64 {
        ms_to_hours(self.time_spent)
    }
}

/// Milliseconds to hours, rounded to two decimals.
pub fn ms_to_hours(ms: u64) -> f64 {
    (ms as f64 / 3_600_000.0 * 100.0).round() / 100.0
}

/// Optional filters for listing a user's time logs.
#[derive(Debug, Clone, Default)]
pub struct TimeLogFilter {
    pub hostname: Option<String>,
    /// Inclusive lower bound on `date`
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `date`
    pub end: Option<DateTime<Utc>>,
}

impl TimeLogFilter {
    pub fn matches(&self, log: &TimeLog) -> bool {
        self.hostname.as_deref().map_or(true, |h| log.hostname == h)
            && self.start.map_or(true, |s| log.date >= s)
            && self.end.map_or(true, |e| log.date <= e)
    }
}

/// Time log as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimeLogView {
    pub id: String,
    pub site: String,
    pub hostname: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub time_spent: u64,
    pub title: String,
    pub url: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub date: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub time_in_minutes: u64,
    pub time_in_hours: f64,
}

impl From<&TimeLog> for TimeLogView {
    fn from(log: &TimeLog) -> Self {
        Self {
            id: log.id.clone(),
            site: log.site.clone(),
            hostname: log.hostname.clone(),
            time_spent: log.time_spent,
            title: log.title.clone(),
            url: log.url.clone(),
            date: log.date,
            time_in_minutes: log.time_in_minutes(),
            time_in_hours: log.time_in_hours(),
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report types: reporting periods, their time windows, and per-site totals.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::local_midnight;

/// Reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Period {
    Daily,
    Weekly,
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            other => Err(format!(
                "Invalid period '{}': expected 'daily' or 'weekly'",
                other
            )),
        }
    }
}

/// Half-open window `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// Compute the window for `period`.
    ///
    /// Without an anchor date: daily is `[local midnight today, now)`,
    /// weekly is `[now - 7 days, now)`. With an anchor, the end is the local
    /// midnight that closes the anchor day and the start is that day's
    /// midnight (daily) or seven days earlier (weekly).
    ///
    /// Returns `None` when the window falls outside the representable
    /// date range.
    pub fn for_period<Tz: TimeZone>(
        period: Period,
        anchor: Option<NaiveDate>,
        now: &DateTime<Tz>,
    ) -> Option<Self> {
        let tz = now.timezone();
        let week = Duration::days(7);
        let (start, end) = match anchor {
            None => {
                let start = match period {
                    Period::Daily => local_midnight(now.date_naive(), &tz),
                    Period::Weekly => now.clone().checked_sub_signed(week)?,
                };
                (start, now.clone())
            }
            Some(date) => {
                let end = local_midnight(date.succ_opt()?, &tz);
                let start = match period {
                    Period::Daily => local_midnight(date, &tz),
                    Period::Weekly => end.clone().checked_sub_signed(week)?,
                };
                (start, end)
            }
        };

        Some(Self {
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// Usage for one local calendar day (weekly reports only).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyUsage {
    /// `YYYY-MM-DD`
    pub date: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub time: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub visits: u64,
}

/// Totals for one hostname.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SiteReport {
    pub hostname: String,
    /// Milliseconds
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_time: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub visits: u64,
    pub time_in_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_data: Option<Vec<DailyUsage>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportTotals {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_time: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_visits: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_sites: u64,
    pub total_time_in_hours: f64,
}

/// A computed report. Never stored; built on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Report {
    pub period: Period,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start_date: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub end_date: DateTime<Utc>,
    /// Sorted by `total_time`, largest first
    pub sites: Vec<SiteReport>,
    pub totals: ReportTotals,
}

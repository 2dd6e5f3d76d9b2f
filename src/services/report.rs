// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report service.
//!
//! Reports are computed on read:
//! 1. Select the user's time logs inside the period window
//! 2. Group by hostname, summing time and counting events
//! 3. Sort groups by total time, largest first

use chrono::{DateTime, NaiveDate, TimeZone};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::time_log::ms_to_hours;
use crate::models::{DailyUsage, Period, Report, ReportTotals, ReportWindow, SiteReport, TimeLog};

pub struct ReportService {
    store: Arc<dyn Store>,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Build a report for `user_id`. `now` fixes both the window and the
    /// time zone used for calendar days.
    pub async fn report<Tz: TimeZone>(
        &self,
        user_id: &str,
        period: Period,
        anchor: Option<NaiveDate>,
        now: DateTime<Tz>,
    ) -> Result<Report> {
        let window = ReportWindow::for_period(period, anchor, &now).ok_or_else(|| {
            AppError::BadRequest("Invalid 'date' parameter: out of range".to_string())
        })?;
        let tz = now.timezone();

        let logs = self
            .store
            .time_logs_in_range(user_id, window.start, window.end)
            .await?;

        tracing::debug!(
            user_id,
            period = ?period,
            start = %window.start,
            end = %window.end,
            events = logs.len(),
            "Building report"
        );

        Ok(aggregate(period, &window, &logs, &tz))
    }
}

/// Group `logs` by hostname. Logs outside `window` are ignored.
///
/// Ties in total time keep first-seen order.
pub fn aggregate<Tz: TimeZone>(
    period: Period,
    window: &ReportWindow,
    logs: &[TimeLog],
    tz: &Tz,
) -> Report {
    struct Group {
        hostname: String,
        total_time: u64,
        visits: u64,
        by_day: BTreeMap<NaiveDate, (u64, u64)>,
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for log in logs.iter().filter(|l| window.contains(l.date)) {
        let slot = *index.entry(log.hostname.as_str()).or_insert_with(|| {
            groups.push(Group {
                hostname: log.hostname.clone(),
                total_time: 0,
                visits: 0,
                by_day: BTreeMap::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.total_time = group.total_time.saturating_add(log.time_spent);
        group.visits += 1;

        if period == Period::Weekly {
            let day = log.date.with_timezone(tz).date_naive();
            let entry = group.by_day.entry(day).or_insert((0, 0));
            entry.0 = entry.0.saturating_add(log.time_spent);
            entry.1 += 1;
        }
    }

    groups.sort_by(|a, b| b.total_time.cmp(&a.total_time));

    let sites: Vec<SiteReport> = groups
        .into_iter()
        .map(|g| SiteReport {
            daily_data: (period == Period::Weekly).then(|| {
                g.by_day
                    .iter()
                    .map(|(day, &(time, visits))| DailyUsage {
                        date: day.format("%Y-%m-%d").to_string(),
                        time,
                        visits,
                    })
                    .collect()
            }),
            time_in_hours: ms_to_hours(g.total_time),
            hostname: g.hostname,
            total_time: g.total_time,
            visits: g.visits,
        })
        .collect();

    let total_time = sites
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(s.total_time));
    let total_visits = sites.iter().map(|s| s.visits).sum();

    Report {
        period,
        start_date: window.start,
        end_date: window.end,
        totals: ReportTotals {
            total_time,
            total_visits,
            total_sites: sites.len() as u64,
            total_time_in_hours: ms_to_hours(total_time),
        },
        sites,
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local aggregate store: hostname -> cumulative milliseconds.
//!
//! Two windows are kept: lifetime and today. The today window remembers
//! which local calendar date it belongs to and starts over the first time it
//! is touched on a later date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type SiteTotals = BTreeMap<String, u64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeTotals {
    lifetime: SiteTotals,
    today: SiteTotals,
    today_date: Option<NaiveDate>,
}

impl TimeTotals {
    /// Add `ms` to `hostname` in both windows.
    pub fn accumulate(&mut self, hostname: &str, ms: u64, date: NaiveDate) {
        self.roll_over(date);
        add(&mut self.lifetime, hostname, ms);
        add(&mut self.today, hostname, ms);
    }

    pub fn lifetime(&self) -> &SiteTotals {
        &self.lifetime
    }

    /// Today's totals as of `date`.
    pub fn today(&mut self, date: NaiveDate) -> &SiteTotals {
        self.roll_over(date);
        &self.today
    }

    pub fn clear(&mut self) {
        self.lifetime.clear();
        self.today.clear();
        self.today_date = None;
    }

    fn roll_over(&mut self, date: NaiveDate) {
        match self.today_date {
            Some(current) if current >= date => {}
            Some(current) => {
                tracing::info!(
                    from = %current,
                    to = %date,
                    sites = self.today.len(),
                    "New day, resetting today's totals"
                );
                self.today.clear();
                self.today_date = Some(date);
            }
            None => self.today_date = Some(date),
        }
    }
}

fn add(totals: &mut SiteTotals, hostname: &str, ms: u64) {
    let entry = totals.entry(hostname.to_string()).or_insert(0);
    *entry = entry.saturating_add(ms);
}

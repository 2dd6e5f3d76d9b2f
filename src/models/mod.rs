// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod report;
pub mod time_log;
pub mod user;

pub use report::{DailyUsage, Period, Report, ReportTotals, ReportWindow, SiteReport};
pub use time_log::{TimeLog, TimeLogFilter, TimeLogView};
pub use user::{Preferences, PreferencesUpdate, PublicUser, User};

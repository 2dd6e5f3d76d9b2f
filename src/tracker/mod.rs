// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser-side tracker.
//!
//! Follows the focused tab, turns focus spans into time samples, keeps
//! lifetime and per-day totals, swaps blocked sites for an interstitial page
//! and pushes every sample to the API server when the user is signed in.
//!
//! The pieces:
//! - [`monitor::TabMonitor`]: `Idle -> Tracking -> Idle` state machine
//! - [`blocklist::BlockList`]: hostname pattern matching
//! - [`aggregate::TimeTotals`]: hostname -> milliseconds maps
//! - [`storage::LocalStorage`]: persisted totals, blocklist and credentials
//! - [`sync::SyncClient`]: `POST /api/timelog` with credential eviction
//! - [`controller::Tracker`]: owns all of the above and dispatches events
//! - [`host`]: native-messaging transport to the extension

pub mod aggregate;
pub mod blocklist;
pub mod browser;
pub mod clock;
pub mod controller;
pub mod host;
pub mod messages;
pub mod monitor;
pub mod storage;
pub mod sync;

pub use controller::Tracker;

/// Errors raised on the tracker side. None of them stop the monitor.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Browser request failed: {0}")]
    Browser(String),

    #[error("Invalid native message frame: {0}")]
    Frame(String),
}

/// Human-readable duration: `1h 5m`, `3m 20s`, `12s`.
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tab activity monitor.
//!
//! At most one interval is open at a time, and it always belongs to the
//! tracked tab. Closing or flushing an interval yields a [`TimeSample`]
//! attributed to the hostname the interval was opened on.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::browser::{Browser, Tab, TabId};
use super::clock::Clock;
use super::sync::TimeSample;
use super::format_duration;

/// An open span of focus on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveInterval {
    pub tab_id: TabId,
    pub hostname: String,
    pub url: String,
    pub title: String,
    /// Start of the not-yet-flushed part of the interval.
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorState {
    Idle,
    Tracking(ActiveInterval),
}

pub struct TabMonitor {
    clock: Arc<dyn Clock>,
    state: MonitorState,
    current_tab: Option<TabId>,
}

impl TabMonitor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: MonitorState::Idle,
            current_tab: None,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn current_tab(&self) -> Option<TabId> {
        self.current_tab
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, MonitorState::Tracking(_))
    }

    /// Focus moved to `tab_id`: close any open interval and start tracking
    /// the new tab.
    pub fn activate(&mut self, tab_id: TabId, browser: &mut dyn Browser) -> Option<TimeSample> {
        let sample = self.stop(browser);
        self.current_tab = Some(tab_id);
        self.start(browser);
        sample
    }

    /// The tracked tab finished loading: restart the interval on its new page.
    pub fn navigation_complete(&mut self, browser: &mut dyn Browser) -> Option<TimeSample> {
        let sample = self.stop(browser);
        self.start(browser);
        sample
    }

    /// The tracked tab started leaving its page.
    pub fn navigation_started(&mut self, browser: &mut dyn Browser) -> Option<TimeSample> {
        self.stop(browser)
    }

    /// A tab was closed. Only the tracked tab matters.
    pub fn tab_removed(&mut self, tab_id: TabId, browser: &mut dyn Browser) -> Option<TimeSample> {
        if self.current_tab != Some(tab_id) {
            return None;
        }
        let sample = self.stop(browser);
        self.current_tab = None;
        sample
    }

    /// Emit the time since the last flush and keep the interval open.
    pub fn flush(&mut self) -> Option<TimeSample> {
        let now = self.clock.time();
        let MonitorState::Tracking(interval) = &mut self.state else {
            return None;
        };
        let sample = sample_for(interval, now);
        interval.started_at = now;
        sample
    }

    /// Drop tracking if the tracked tab is gone or now shows an internal
    /// page. The unflushed remainder is discarded.
    pub fn health_check(&mut self, browser: &mut dyn Browser) {
        let MonitorState::Tracking(interval) = &self.state else {
            return;
        };

        let still_valid = match browser.get_tab(interval.tab_id) {
            Ok(Some(tab)) => tab.trackable_hostname().is_some(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Tab lookup failed during health check");
                false
            }
        };

        if !still_valid {
            tracing::info!(tab_id = interval.tab_id, "Stopping tracking for invalid tab");
            self.state = MonitorState::Idle;
            self.badge(browser, false);
        }
    }

    /// Start tracking whatever the current tab shows, if it is trackable.
    pub fn start(&mut self, browser: &mut dyn Browser) {
        let Some(tab_id) = self.current_tab else {
            return;
        };

        match browser.get_tab(tab_id) {
            Ok(Some(tab)) => self.open(tab, browser),
            Ok(None) => {
                tracing::debug!(tab_id, "Tab vanished before tracking started");
                self.state = MonitorState::Idle;
            }
            Err(e) => {
                tracing::warn!(error = %e, tab_id, "Error starting tracking");
                self.state = MonitorState::Idle;
            }
        }
    }

    /// Close the open interval, if any.
    pub fn stop(&mut self, browser: &mut dyn Browser) -> Option<TimeSample> {
        let MonitorState::Tracking(interval) =
            std::mem::replace(&mut self.state, MonitorState::Idle)
        else {
            return None;
        };

        let sample = sample_for(&interval, self.clock.time());
        if let Some(s) = &sample {
            tracing::debug!(
                hostname = %s.hostname,
                duration = %format_duration(s.duration_ms),
                "Stopped tracking"
            );
        }
        self.badge(browser, false);
        sample
    }

    fn open(&mut self, tab: Tab, browser: &mut dyn Browser) {
        let Some(hostname) = tab.trackable_hostname() else {
            tracing::debug!(tab_id = tab.id, "Skipping tracking for internal page");
            self.state = MonitorState::Idle;
            return;
        };

        tracing::debug!(tab_id = tab.id, %hostname, "Started tracking");
        self.state = MonitorState::Tracking(ActiveInterval {
            tab_id: tab.id,
            hostname,
            url: tab.url,
            title: tab.title,
            started_at: self.clock.time(),
        });
        self.badge(browser, true);
    }

    fn badge(&self, browser: &mut dyn Browser, tracking: bool) {
        if let Err(e) = browser.set_badge(self.current_tab, tracking) {
            tracing::debug!(error = %e, "Badge update failed");
        }
    }
}

/// Sample for the part of `interval` before `now`. Empty spans yield nothing.
fn sample_for(interval: &ActiveInterval, now: DateTime<Utc>) -> Option<TimeSample> {
    let elapsed = (now - interval.started_at).num_milliseconds();
    if elapsed <= 0 {
        return None;
    }
    Some(TimeSample {
        hostname: interval.hostname.clone(),
        url: interval.url.clone(),
        title: interval.title.clone(),
        duration_ms: elapsed as u64,
        captured_at: now,
    })
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The tracker controller.
//!
//! One [`Tracker`] exists per host process. It owns the monitor, the
//! persisted state and the sync client, and every event, tick and request
//! goes through it in order, so no two handlers ever touch the open interval
//! at once.

use std::sync::Arc;

use super::blocklist::{interstitial_url, random_quote, BlockList};
use super::browser::{Browser, Tab, TabId};
use super::clock::Clock;
use super::messages::{LoadStatus, Request, Response, TabEvent, TrackingSnapshot};
use super::monitor::{MonitorState, TabMonitor};
use super::storage::{Credentials, LocalState, LocalStorage};
use super::sync::{SyncClient, SyncOutcome, TimeSample};
use super::format_duration;

pub struct Tracker<B: Browser> {
    monitor: TabMonitor,
    browser: B,
    clock: Arc<dyn Clock>,
    state: LocalState,
    storage: LocalStorage,
    sync: SyncClient,
}

impl<B: Browser> Tracker<B> {
    /// Load saved state and build the tracker. Unreadable state is replaced
    /// with first-run defaults.
    pub async fn new(
        browser: B,
        clock: Arc<dyn Clock>,
        storage: LocalStorage,
        sync: SyncClient,
    ) -> Self {
        let state = match storage.load().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Saved state unreadable, starting from defaults");
                LocalState::default()
            }
        };

        Self {
            monitor: TabMonitor::new(clock.clone()),
            browser,
            clock,
            state,
            storage,
            sync,
        }
    }

    /// Persist first-run defaults and verify any stored credentials.
    pub async fn start(&mut self) {
        self.persist().await;
        tracing::info!(
            blocked_sites = self.state.blocked_sites.patterns().len(),
            logged_in = self.state.credentials.is_some(),
            "Tracker started"
        );
        self.check_connection().await;
    }

    /// Check the API with the stored token. A 401 evicts the credentials.
    pub async fn check_connection(&mut self) -> Option<SyncOutcome> {
        let token = self.state.credentials.as_ref()?.token.clone();
        let outcome = self.sync.check_connection(&token).await;
        match outcome {
            SyncOutcome::Synced => tracing::info!("Backend connection successful"),
            SyncOutcome::Unauthorized => self.evict_credentials().await,
            _ => tracing::warn!("Backend connection failed"),
        }
        Some(outcome)
    }

    pub fn state(&self) -> &LocalState {
        &self.state
    }

    pub fn monitor(&self) -> &TabMonitor {
        &self.monitor
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub async fn handle_event(&mut self, event: TabEvent) {
        self.browser.observe(&event);

        let sample = match event {
            TabEvent::Activated { tab } => self.monitor.activate(tab.id, &mut self.browser),
            TabEvent::Updated { tab, change } => {
                if change.url.is_some() && self.block_if_listed(&tab) {
                    return;
                }
                if self.monitor.current_tab() != Some(tab.id) {
                    None
                } else if change.status == Some(LoadStatus::Complete) {
                    self.monitor.navigation_complete(&mut self.browser)
                } else if change.url.is_some() {
                    self.monitor.navigation_started(&mut self.browser)
                } else {
                    None
                }
            }
            TabEvent::Removed { tab_id } => self.monitor.tab_removed(tab_id, &mut self.browser),
            TabEvent::Snapshot { active_tab_id, .. } => {
                match (self.monitor.current_tab(), active_tab_id) {
                    (None, Some(id)) => self.monitor.activate(id, &mut self.browser),
                    _ => None,
                }
            }
        };

        if let Some(sample) = sample {
            self.record(sample).await;
        }
    }

    /// Flush tick.
    pub async fn flush(&mut self) {
        if let Some(sample) = self.monitor.flush() {
            self.record(sample).await;
        }
    }

    /// Health tick.
    pub fn health_check(&mut self) {
        self.monitor.health_check(&mut self.browser);
    }

    /// Close the open interval before the process exits.
    pub async fn shutdown(&mut self) {
        if let Some(sample) = self.monitor.stop(&mut self.browser) {
            self.record(sample).await;
        }
    }

    pub async fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::GetTimeData => Response::TimeData {
                time_data: self.state.totals.lifetime().clone(),
            },
            Request::GetTodayData => {
                let today = self.clock.local_date();
                Response::TodayData {
                    today_data: self.state.totals.today(today).clone(),
                }
            }
            Request::ClearTimeData => {
                self.state.totals.clear();
                self.persist().await;
                tracing::info!("Cleared local time data");
                Response::ok()
            }
            Request::GetBlockedSites => Response::BlockedSites {
                blocked_sites: self.state.blocked_sites.patterns().to_vec(),
            },
            Request::AddBlockedSite { site } => {
                if self.state.blocked_sites.add(&site) {
                    tracing::info!(%site, "Added blocked site");
                    self.persist().await;
                }
                Response::ok()
            }
            Request::RemoveBlockedSite { site } => {
                if self.state.blocked_sites.remove(&site) {
                    tracing::info!(%site, "Removed blocked site");
                    self.persist().await;
                }
                Response::ok()
            }
            Request::CheckAuthStatus => Response::AuthStatus {
                is_logged_in: self.state.credentials.is_some(),
                user: self
                    .state
                    .credentials
                    .as_ref()
                    .and_then(|c| c.user.clone()),
            },
            Request::SyncAuth { token, user } => {
                if token.trim().is_empty() {
                    return Response::Ack {
                        success: false,
                        message: Some("Token is required".to_string()),
                    };
                }
                self.state.credentials = Some(Credentials { token, user });
                self.persist().await;
                tracing::info!("Auth data synced from web app");
                Response::ok()
            }
            Request::Logout => {
                self.state.credentials = None;
                self.state.blocked_sites = BlockList::default();
                self.persist().await;
                tracing::info!("User logged out, reset blocked sites");
                Response::ok()
            }
            Request::GetCurrentTab => Response::Tracking(self.snapshot(false)),
            Request::DebugTracking => Response::Tracking(self.snapshot(true)),
            Request::StartManualTracking { tab_id } => self.start_manual_tracking(tab_id).await,
        }
    }

    async fn start_manual_tracking(&mut self, tab_id: Option<TabId>) -> Response {
        let target = match tab_id {
            Some(id) => Some(id),
            None => match self.browser.active_tab() {
                Ok(tab) => tab.map(|t| t.id),
                Err(e) => {
                    tracing::warn!(error = %e, "Active tab lookup failed");
                    None
                }
            },
        };

        let Some(id) = target else {
            return Response::Ack {
                success: false,
                message: Some("No active tab found".to_string()),
            };
        };

        if let Some(sample) = self.monitor.activate(id, &mut self.browser) {
            self.record(sample).await;
        }
        Response::Ack {
            success: true,
            message: Some("Manual tracking started".to_string()),
        }
    }

    fn snapshot(&self, debug: bool) -> TrackingSnapshot {
        let start_time = match self.monitor.state() {
            MonitorState::Tracking(interval) => Some(interval.started_at.timestamp_millis()),
            MonitorState::Idle => None,
        };
        TrackingSnapshot {
            current_tab_id: self.monitor.current_tab(),
            is_tracking: self.monitor.is_tracking(),
            start_time,
            tracking_interval: self.monitor.is_tracking(),
            blocked_sites: debug.then(|| self.state.blocked_sites.patterns().to_vec()),
        }
    }

    /// Swap a blocked page for the interstitial. Returns true if it did.
    fn block_if_listed(&mut self, tab: &Tab) -> bool {
        let Some(hostname) = tab.trackable_hostname() else {
            return false;
        };
        let Some(pattern) = self
            .state
            .blocked_sites
            .matching(&hostname)
            .map(str::to_string)
        else {
            return false;
        };

        tracing::info!(%hostname, %pattern, "Blocking distracting site");
        if let Err(e) = self
            .browser
            .navigate(tab.id, &interstitial_url(random_quote()))
        {
            tracing::warn!(error = %e, "Error redirecting to interstitial page");
        }
        true
    }

    /// Fold a sample into the local totals, save, and push it upstream.
    async fn record(&mut self, sample: TimeSample) {
        let today = self.clock.local_date();
        self.state
            .totals
            .accumulate(&sample.hostname, sample.duration_ms, today);

        let total = self
            .state
            .totals
            .lifetime()
            .get(&sample.hostname)
            .copied()
            .unwrap_or_default();
        tracing::debug!(
            hostname = %sample.hostname,
            total = %format_duration(total),
            "Saved time"
        );
        self.persist().await;

        let token = self.state.credentials.as_ref().map(|c| c.token.clone());
        if self.sync.push(token.as_deref(), &sample).await == SyncOutcome::Unauthorized {
            self.evict_credentials().await;
        }
    }

    async fn evict_credentials(&mut self) {
        self.state.credentials = None;
        self.persist().await;
        tracing::info!("Auth token rejected, removed from storage");
    }

    async fn persist(&self) {
        if let Err(e) = self.storage.save(&self.state).await {
            tracing::warn!(error = %e, "Failed to save tracker state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::blocklist::DEFAULT_BLOCKED_SITES;
    use crate::tracker::clock::ManualClock;
    use crate::tracker::messages::TabChange;
    use crate::tracker::monitor::tests::FakeBrowser;
    use chrono::{Duration, TimeZone, Utc};

    async fn new_tracker(browser: FakeBrowser) -> (Tracker<FakeBrowser>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap());
        let tracker = Tracker::new(
            browser,
            Arc::new(clock.clone()),
            LocalStorage::in_memory(),
            SyncClient::new("http://127.0.0.1:9"),
        )
        .await;
        (tracker, clock)
    }

    fn tab(id: TabId, url: &str) -> Tab {
        Tab {
            id,
            url: url.to_string(),
            title: String::new(),
        }
    }

    fn navigated(id: TabId, url: &str) -> TabEvent {
        TabEvent::Updated {
            tab: tab(id, url),
            change: TabChange {
                url: Some(url.to_string()),
                status: None,
            },
        }
    }

    fn completed(id: TabId, url: &str) -> TabEvent {
        TabEvent::Updated {
            tab: tab(id, url),
            change: TabChange {
                url: None,
                status: Some(LoadStatus::Complete),
            },
        }
    }

    #[tokio::test]
    async fn test_flush_accumulates_locally_without_credentials() {
        let (mut tracker, clock) = new_tracker(FakeBrowser::default()).await;
        tracker
            .handle_event(TabEvent::Activated {
                tab: tab(1, "https://docs.rs/"),
            })
            .await;

        clock.advance(Duration::seconds(5));
        tracker.flush().await;
        clock.advance(Duration::seconds(5));
        tracker.flush().await;

        assert_eq!(tracker.state().totals.lifetime()["docs.rs"], 10_000);
        match tracker.handle_request(Request::GetTodayData).await {
            Response::TodayData { today_data } => assert_eq!(today_data["docs.rs"], 10_000),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blocked_navigation_shows_interstitial_and_skips_tracking() {
        let (mut tracker, clock) = new_tracker(FakeBrowser::default()).await;
        tracker
            .handle_event(TabEvent::Activated {
                tab: tab(1, "https://docs.rs/"),
            })
            .await;
        clock.advance(Duration::seconds(2));

        tracker
            .handle_event(navigated(1, "https://m.facebook.com/feed"))
            .await;

        let navigations = &tracker.browser().navigations;
        assert_eq!(navigations.len(), 1);
        assert!(navigations[0].1.starts_with("data:text/html"));
        // The interval on the previous page is untouched.
        assert!(tracker.monitor().is_tracking());
        assert!(tracker.state().totals.lifetime().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_on_tracked_tab_restarts_interval() {
        let (mut tracker, clock) = new_tracker(FakeBrowser::default()).await;
        tracker
            .handle_event(TabEvent::Activated {
                tab: tab(1, "https://docs.rs/"),
            })
            .await;
        clock.advance(Duration::seconds(3));

        tracker
            .handle_event(navigated(1, "https://crates.io/"))
            .await;
        assert!(!tracker.monitor().is_tracking());
        assert_eq!(tracker.state().totals.lifetime()["docs.rs"], 3_000);

        tracker.handle_event(completed(1, "https://crates.io/")).await;
        assert!(tracker.monitor().is_tracking());

        clock.advance(Duration::seconds(1));
        tracker.handle_event(TabEvent::Removed { tab_id: 1 }).await;
        assert_eq!(tracker.state().totals.lifetime()["crates.io"], 1_000);
        assert_eq!(tracker.monitor().current_tab(), None);
    }

    #[tokio::test]
    async fn test_events_for_other_tabs_are_ignored() {
        let (mut tracker, _) = new_tracker(FakeBrowser::default()).await;
        tracker
            .handle_event(TabEvent::Activated {
                tab: tab(1, "https://docs.rs/"),
            })
            .await;

        tracker.handle_event(completed(2, "https://crates.io/")).await;
        match tracker.monitor().state() {
            MonitorState::Tracking(i) => assert_eq!(i.hostname, "docs.rs"),
            MonitorState::Idle => panic!("expected tracking"),
        }
    }

    #[tokio::test]
    async fn test_snapshot_starts_tracking_active_tab() {
        let (mut tracker, _) = new_tracker(FakeBrowser::default()).await;
        tracker
            .handle_event(TabEvent::Snapshot {
                tabs: vec![tab(4, "https://docs.rs/"), tab(5, "https://crates.io/")],
                active_tab_id: Some(5),
            })
            .await;

        assert_eq!(tracker.monitor().current_tab(), Some(5));
        assert!(tracker.monitor().is_tracking());
    }

    #[tokio::test]
    async fn test_blocklist_requests() {
        let (mut tracker, _) = new_tracker(FakeBrowser::default()).await;

        tracker
            .handle_request(Request::AddBlockedSite {
                site: "news.ycombinator.com".into(),
            })
            .await;
        tracker
            .handle_request(Request::RemoveBlockedSite {
                site: " facebook.com ".into(),
            })
            .await;

        match tracker.handle_request(Request::GetBlockedSites).await {
            Response::BlockedSites { blocked_sites } => {
                assert!(blocked_sites.contains(&"news.ycombinator.com".to_string()));
                assert!(!blocked_sites.contains(&"facebook.com".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_auth_and_logout() {
        let (mut tracker, _) = new_tracker(FakeBrowser::default()).await;

        let resp = tracker
            .handle_request(Request::SyncAuth {
                token: "abc".into(),
                user: Some(serde_json::json!({"email": "a@example.com"})),
            })
            .await;
        assert_eq!(resp, Response::ok());

        match tracker.handle_request(Request::CheckAuthStatus).await {
            Response::AuthStatus { is_logged_in, user } => {
                assert!(is_logged_in);
                assert_eq!(user.unwrap()["email"], "a@example.com");
            }
            other => panic!("unexpected {:?}", other),
        }

        tracker
            .handle_request(Request::AddBlockedSite {
                site: "extra.com".into(),
            })
            .await;
        tracker.handle_request(Request::Logout).await;

        assert!(tracker.state().credentials.is_none());
        assert_eq!(
            tracker.state().blocked_sites.patterns().len(),
            DEFAULT_BLOCKED_SITES.len()
        );
    }

    #[tokio::test]
    async fn test_clear_time_data() {
        let (mut tracker, clock) = new_tracker(FakeBrowser::default()).await;
        tracker
            .handle_event(TabEvent::Activated {
                tab: tab(1, "https://docs.rs/"),
            })
            .await;
        clock.advance(Duration::seconds(5));
        tracker.flush().await;

        tracker.handle_request(Request::ClearTimeData).await;
        match tracker.handle_request(Request::GetTimeData).await {
            Response::TimeData { time_data } => assert!(time_data.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_manual_tracking() {
        let (mut tracker, _) = new_tracker(FakeBrowser::default()).await;
        let resp = tracker
            .handle_request(Request::StartManualTracking { tab_id: None })
            .await;
        assert_eq!(
            resp,
            Response::Ack {
                success: false,
                message: Some("No active tab found".into())
            }
        );

        let browser = FakeBrowser::default().with_tab(3, "https://docs.rs/");
        let (mut tracker, _) = new_tracker(browser).await;
        tracker
            .handle_request(Request::StartManualTracking { tab_id: Some(3) })
            .await;

        match tracker.handle_request(Request::DebugTracking).await {
            Response::Tracking(snapshot) => {
                assert_eq!(snapshot.current_tab_id, Some(3));
                assert!(snapshot.is_tracking);
                assert!(snapshot.start_time.is_some());
                assert!(snapshot.blocked_sites.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_today_rolls_over_at_local_midnight() {
        let (mut tracker, clock) = new_tracker(FakeBrowser::default()).await;
        tracker
            .handle_event(TabEvent::Activated {
                tab: tab(1, "https://docs.rs/"),
            })
            .await;
        clock.advance(Duration::seconds(5));
        tracker.flush().await;

        clock.advance(Duration::days(1));
        match tracker.handle_request(Request::GetTodayData).await {
            Response::TodayData { today_data } => assert!(today_data.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(tracker.state().totals.lifetime()["docs.rs"], 5_000);
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The tracker's view of the browser.
//!
//! [`Browser`] is the seam between tracking logic and whatever delivers tab
//! state. [`ExtensionBrowser`] is the production implementation: it mirrors
//! tab state from the events the extension pushes and sends commands back
//! through the native-messaging outbox.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;

use super::messages::{Command, Outbound, TabEvent};
use super::TrackerError;

pub type TabId = u64;

/// Schemes that belong to the browser itself and are never tracked.
const INTERNAL_PREFIXES: [&str; 5] = [
    "chrome://",
    "chrome-extension://",
    "about:",
    "moz-extension://",
    "edge://",
];

const BADGE_TRACKING_TEXT: &str = "●";
const BADGE_TRACKING_COLOR: &str = "#4CAF50";
const BADGE_IDLE_COLOR: &str = "#666666";

/// Snapshot of one browser tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl Tab {
    /// Hostname of a trackable page, `None` for internal or hostless URLs.
    pub fn trackable_hostname(&self) -> Option<String> {
        if is_internal_page(&self.url) {
            return None;
        }
        hostname_of(&self.url)
    }
}

pub fn is_internal_page(url: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|p| url.starts_with(p))
}

/// Host part of `url`, or `None` when it has none (`data:`, `file:`, junk).
pub fn hostname_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()?
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// Contract the monitor needs from the browser.
pub trait Browser: Send {
    /// Current state of tab `id`, `Ok(None)` if it no longer exists.
    fn get_tab(&self, id: TabId) -> Result<Option<Tab>, TrackerError>;

    /// The focused tab, if any.
    fn active_tab(&self) -> Result<Option<Tab>, TrackerError>;

    /// Replace the content of tab `id` with `url`.
    fn navigate(&mut self, id: TabId, url: &str) -> Result<(), TrackerError>;

    /// Show or clear the tracking badge.
    fn set_badge(&mut self, tab: Option<TabId>, tracking: bool) -> Result<(), TrackerError>;

    /// Called with every event before it is handled.
    fn observe(&mut self, _event: &TabEvent) {}
}

/// Browser backed by extension events and the native-messaging outbox.
pub struct ExtensionBrowser {
    tabs: HashMap<TabId, Tab>,
    active: Option<TabId>,
    outbox: mpsc::UnboundedSender<Outbound>,
}

impl ExtensionBrowser {
    pub fn new(outbox: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            tabs: HashMap::new(),
            active: None,
            outbox,
        }
    }

    fn send(&self, command: Command) -> Result<(), TrackerError> {
        self.outbox
            .send(Outbound::Command(command))
            .map_err(|_| TrackerError::Browser("extension channel closed".to_string()))
    }
}

impl Browser for ExtensionBrowser {
    fn get_tab(&self, id: TabId) -> Result<Option<Tab>, TrackerError> {
        Ok(self.tabs.get(&id).cloned())
    }

    fn active_tab(&self) -> Result<Option<Tab>, TrackerError> {
        Ok(self.active.and_then(|id| self.tabs.get(&id).cloned()))
    }

    fn navigate(&mut self, id: TabId, url: &str) -> Result<(), TrackerError> {
        self.send(Command::Navigate {
            tab_id: id,
            url: url.to_string(),
        })
    }

    fn set_badge(&mut self, tab: Option<TabId>, tracking: bool) -> Result<(), TrackerError> {
        let (text, color) = if tracking {
            (BADGE_TRACKING_TEXT, BADGE_TRACKING_COLOR)
        } else {
            ("", BADGE_IDLE_COLOR)
        };
        self.send(Command::SetBadge {
            tab_id: tab,
            text: text.to_string(),
            color: color.to_string(),
        })
    }

    fn observe(&mut self, event: &TabEvent) {
        match event {
            TabEvent::Activated { tab } => {
                self.active = Some(tab.id);
                self.tabs.insert(tab.id, tab.clone());
            }
            TabEvent::Updated { tab, .. } => {
                self.tabs.insert(tab.id, tab.clone());
            }
            TabEvent::Removed { tab_id } => {
                self.tabs.remove(tab_id);
                if self.active == Some(*tab_id) {
                    self.active = None;
                }
            }
            TabEvent::Snapshot {
                tabs,
                active_tab_id,
            } => {
                self.tabs = tabs.iter().map(|t| (t.id, t.clone())).collect();
                self.active = *active_tab_id;
            }
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Messages exchanged with the extension.
//!
//! Inbound frames are either tab events or action-tagged requests from the
//! popup and dashboard; outbound frames are request responses or browser
//! commands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::browser::{Tab, TabId};

/// Frame read from the extension.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inbound {
    Event(TabEvent),
    Request { id: u64, request: Request },
}

/// Frame written to the extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound {
    Response { id: u64, response: Response },
    Command(Command),
}

/// Tab lifecycle events pushed by the extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TabEvent {
    /// A tab gained focus.
    Activated { tab: Tab },
    /// A tab's URL or load status changed. `tab` is the state after the change.
    Updated {
        tab: Tab,
        #[serde(default)]
        change: TabChange,
    },
    Removed { tab_id: TabId },
    /// Full tab list, sent when the extension connects.
    Snapshot {
        tabs: Vec<Tab>,
        active_tab_id: Option<TabId>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LoadStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loading,
    Complete,
}

/// Commands the host asks the extension to carry out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Navigate {
        tab_id: TabId,
        url: String,
    },
    SetBadge {
        tab_id: Option<TabId>,
        text: String,
        color: String,
    },
}

/// Popup and dashboard requests.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    GetTimeData,
    GetTodayData,
    ClearTimeData,
    GetBlockedSites,
    AddBlockedSite {
        #[serde(default)]
        site: String,
    },
    RemoveBlockedSite {
        #[serde(default)]
        site: String,
    },
    CheckAuthStatus,
    SyncAuth {
        token: String,
        #[serde(default)]
        user: Option<serde_json::Value>,
    },
    Logout,
    GetCurrentTab,
    DebugTracking,
    /// Track `tab_id`, or the focused tab when omitted.
    StartManualTracking {
        #[serde(default)]
        tab_id: Option<TabId>,
    },
}

/// Response shapes, one per request family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum Response {
    TimeData {
        time_data: BTreeMap<String, u64>,
    },
    TodayData {
        today_data: BTreeMap<String, u64>,
    },
    BlockedSites {
        blocked_sites: Vec<String>,
    },
    AuthStatus {
        is_logged_in: bool,
        user: Option<serde_json::Value>,
    },
    Tracking(TrackingSnapshot),
    Ack {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Response {
    pub fn ok() -> Self {
        Response::Ack {
            success: true,
            message: None,
        }
    }
}

/// Monitor state as reported to `getCurrentTab` and `debugTracking`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSnapshot {
    pub current_tab_id: Option<TabId>,
    pub is_tracking: bool,
    /// Start of the current flush span, Unix milliseconds.
    pub start_time: Option<i64>,
    pub tracking_interval: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_sites: Option<Vec<String>>,
}

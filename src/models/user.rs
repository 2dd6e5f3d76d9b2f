// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Sites blocked for a freshly registered user.
pub const DEFAULT_USER_BLOCKED_SITES: [&str; 2] = ["facebook.com", "youtube.com"];

/// Default daily goal in minutes (8 hours).
pub const DEFAULT_DAILY_GOAL: u32 = 480;

/// Stored user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUID (also used as document ID)
    pub id: String,
    /// Unique, compared exactly
    pub email: String,
    /// PBKDF2 hash in `pbkdf2-sha256$iterations$salt$hash` form
    pub password_hash: String,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
}

/// Per-user settings shared by the dashboard and the extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Preferences {
    pub blocked_sites: Vec<String>,
    /// Minutes per day
    pub daily_goal: u32,
    pub notifications: bool,
    /// "auto", "light" or "dark"
    pub theme: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            blocked_sites: DEFAULT_USER_BLOCKED_SITES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            daily_goal: DEFAULT_DAILY_GOAL,
            notifications: true,
            theme: "auto".to_string(),
        }
    }
}

/// Partial preferences from a profile update.
///
/// Only the supplied top-level fields change. `blocked_sites` is replaced
/// wholesale, never merged element by element.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesUpdate {
    pub blocked_sites: Option<Vec<String>>,
    pub daily_goal: Option<u32>,
    pub notifications: Option<bool>,
    pub theme: Option<String>,
}

impl PreferencesUpdate {
    /// Shallow-merge the supplied fields into `prefs`.
    pub fn apply(self, prefs: &mut Preferences) {
        if let Some(sites) = self.blocked_sites {
            prefs.blocked_sites = sites;
        }
        if let Some(goal) = self.daily_goal {
            prefs.daily_goal = goal;
        }
        if let Some(notifications) = self.notifications {
            prefs.notifications = notifications;
        }
        if let Some(theme) = self.theme {
            prefs.theme = theme;
        }
    }
}

/// User as returned by the API (no password hash).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub preferences: Preferences,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            preferences: user.preferences.clone(),
            created_at: user.created_at,
        }
    }
}

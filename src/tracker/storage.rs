// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted tracker state: totals, blocklist and credentials.
//!
//! Stored as one JSON document. Saves go through a temporary file and a
//! rename so a crash mid-write leaves the previous state intact.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

use super::aggregate::TimeTotals;
use super::blocklist::BlockList;
use super::TrackerError;

/// Token and user record shared with the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalState {
    pub totals: TimeTotals,
    pub blocked_sites: BlockList,
    pub credentials: Option<Credentials>,
}

pub struct LocalStorage {
    path: Option<PathBuf>,
}

impl LocalStorage {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Storage that never touches disk.
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// Load saved state. A missing file is a first run and yields defaults.
    pub async fn load(&self) -> Result<LocalState, TrackerError> {
        let Some(path) = &self.path else {
            return Ok(LocalState::default());
        };

        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No saved state, starting fresh");
                Ok(LocalState::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, state: &LocalState) -> Result<(), TrackerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(state)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Productivity Tracker: time spent on websites, synced and reported.
//!
//! The crate has two halves:
//! - the API server (`routes`, `services`, `db`): accounts, time log
//!   ingestion and per-site reports;
//! - the browser-side tracker (`tracker`): follows the focused tab,
//!   keeps local totals, enforces the blocklist and pushes samples to the
//!   server.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod tracker;

use config::Config;
use db::Store;
use services::{AccountService, ReportService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub accounts: AccountService,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let accounts = AccountService::new(
            store.clone(),
            config.jwt_signing_key.clone(),
            config.password_iterations,
        );
        let reports = ReportService::new(store.clone());
        Self {
            config,
            store,
            accounts,
            reports,
        }
    }
}

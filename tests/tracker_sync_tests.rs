// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracker-to-server sync tests.
//!
//! Runs the real API router on a loopback port and points the tracker's
//! sync client at it.

use chrono::{Duration, TimeZone, Utc};
use productivity_tracker::tracker::browser::{ExtensionBrowser, Tab};
use productivity_tracker::tracker::clock::ManualClock;
use productivity_tracker::tracker::messages::{Request, Response, TabEvent};
use productivity_tracker::tracker::storage::LocalStorage;
use productivity_tracker::tracker::sync::{SyncClient, SyncOutcome, TimeSample};
use productivity_tracker::tracker::Tracker;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

mod common;

/// Serve the test app on an ephemeral port. Returns its base URL.
async fn spawn_server() -> (String, axum::Router) {
    let (app, _) = common::create_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, served).await.unwrap();
    });
    (format!("http://{}", addr), app)
}

fn sample() -> TimeSample {
    TimeSample {
        hostname: "docs.rs".to_string(),
        url: "https://docs.rs/axum".to_string(),
        title: "axum - Rust".to_string(),
        duration_ms: 5_000,
        captured_at: Utc::now(),
    }
}

async fn time_logs(app: &axum::Router, token: &str) -> Vec<Value> {
    let (_, body) = common::send(app, "GET", "/api/timelog", Some(token), None).await;
    body["data"]["timeLogs"].as_array().unwrap().clone()
}

#[tokio::test]
async fn test_push_creates_time_log() {
    let (base_url, app) = spawn_server().await;
    let token = common::register(&app, "sync@example.com").await;
    let client = SyncClient::new(format!("{}/", base_url));

    assert_eq!(client.push(Some(&token), &sample()).await, SyncOutcome::Synced);
    assert_eq!(client.check_connection(&token).await, SyncOutcome::Synced);

    let logs = time_logs(&app, &token).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["site"], "axum - Rust");
    assert_eq!(logs[0]["hostname"], "docs.rs");
    assert_eq!(logs[0]["timeSpent"], 5_000);
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let (base_url, _) = spawn_server().await;
    let client = SyncClient::new(base_url);

    assert_eq!(
        client.push(Some("not-a-jwt"), &sample()).await,
        SyncOutcome::Unauthorized
    );
    assert_eq!(
        client.check_connection("not-a-jwt").await,
        SyncOutcome::Unauthorized
    );
}

async fn tracker_for(base_url: &str) -> (Tracker<ExtensionBrowser>, ManualClock) {
    let (tx, _rx) = mpsc::unbounded_channel();
    // Commands are dropped once the receiver goes away; the tracker only logs that.
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap());
    let tracker = Tracker::new(
        ExtensionBrowser::new(tx),
        Arc::new(clock.clone()),
        LocalStorage::in_memory(),
        SyncClient::new(base_url),
    )
    .await;
    (tracker, clock)
}

fn focus(id: u64, url: &str) -> TabEvent {
    TabEvent::Activated {
        tab: Tab {
            id,
            url: url.to_string(),
            title: String::new(),
        },
    }
}

#[tokio::test]
async fn test_tracker_pushes_flushed_samples() {
    let (base_url, app) = spawn_server().await;
    let token = common::register(&app, "tracker@example.com").await;
    let (mut tracker, clock) = tracker_for(&base_url).await;

    let resp = tracker
        .handle_request(Request::SyncAuth {
            token: token.clone(),
            user: None,
        })
        .await;
    assert_eq!(resp, Response::ok());

    tracker.handle_event(focus(1, "https://crates.io/")).await;
    clock.advance(Duration::seconds(5));
    tracker.flush().await;
    clock.advance(Duration::seconds(2));
    tracker.handle_event(focus(2, "chrome://newtab")).await;

    let logs = time_logs(&app, &token).await;
    assert_eq!(logs.len(), 2);
    let total: u64 = logs.iter().map(|l| l["timeSpent"].as_u64().unwrap()).sum();
    assert_eq!(total, 7_000);
    // Untitled tabs are labelled by hostname.
    assert_eq!(logs[0]["site"], "crates.io");
    assert_eq!(tracker.state().totals.lifetime()["crates.io"], 7_000);
}

#[tokio::test]
async fn test_tracker_evicts_rejected_credentials() {
    let (base_url, _) = spawn_server().await;
    let (mut tracker, clock) = tracker_for(&base_url).await;

    tracker
        .handle_request(Request::SyncAuth {
            token: "stale-token".to_string(),
            user: None,
        })
        .await;
    assert_eq!(tracker.check_connection().await, Some(SyncOutcome::Unauthorized));
    assert!(tracker.state().credentials.is_none());

    // Without credentials samples stay local.
    tracker.handle_event(focus(1, "https://crates.io/")).await;
    clock.advance(Duration::seconds(3));
    tracker.flush().await;
    assert_eq!(tracker.state().totals.lifetime()["crates.io"], 3_000);

    tracker
        .handle_request(Request::SyncAuth {
            token: "stale-again".to_string(),
            user: None,
        })
        .await;
    clock.advance(Duration::seconds(1));
    tracker.flush().await;
    assert!(tracker.state().credentials.is_none());
    assert_eq!(tracker.state().totals.lifetime()["crates.io"], 4_000);
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Native-messaging host for the Productivity Tracker browser extension.
//!
//! stdout carries the message protocol, so logs go to stderr.

use productivity_tracker::{config::TrackerConfig, tracker::host};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = TrackerConfig::from_env()?;
    tracing::info!(
        api_url = %config.api_url,
        state_path = %config.state_path.display(),
        "Starting tracker host"
    );

    host::run(&config, tokio::io::stdin(), tokio::io::stdout()).await
}

fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("productivity_tracker=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}

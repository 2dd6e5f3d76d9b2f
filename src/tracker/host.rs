// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Native-messaging host.
//!
//! The extension talks to the host over stdin/stdout. Each message is a
//! 32-bit length in native byte order followed by that many bytes of JSON.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::browser::ExtensionBrowser;
use super::clock::SystemClock;
use super::messages::{Inbound, Outbound};
use super::storage::LocalStorage;
use super::sync::SyncClient;
use super::{Tracker, TrackerError};
use crate::config::TrackerConfig;

/// Largest frame accepted in either direction.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Read one frame. Returns `None` when the stream ends between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, TrackerError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_ne_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(TrackerError::Frame(format!(
            "length {} exceeds {} bytes",
            len, MAX_FRAME_LEN
        )));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(buf))
}

pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), TrackerError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_LEN {
        return Err(TrackerError::Frame(format!(
            "outgoing length {} exceeds {} bytes",
            payload.len(),
            MAX_FRAME_LEN
        )));
    }

    writer
        .write_all(&(payload.len() as u32).to_ne_bytes())
        .await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_message<R>(reader: &mut R) -> Result<Option<Inbound>, TrackerError>
where
    R: AsyncRead + Unpin,
{
    match read_frame(reader).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), TrackerError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    write_frame(writer, &serde_json::to_vec(message)?).await
}

/// Serve one extension connection until its input stream closes.
pub async fn run<R, W>(config: &TrackerConfig, reader: R, writer: W) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_loop(writer, out_rx));

    let (in_tx, mut in_rx) = mpsc::channel(64);
    let reader_task = tokio::spawn(read_loop(reader, in_tx));

    let mut tracker = Tracker::new(
        ExtensionBrowser::new(out_tx.clone()),
        Arc::new(SystemClock),
        LocalStorage::file(&config.state_path),
        SyncClient::new(config.api_url.clone()),
    )
    .await;
    tracker.start().await;

    let mut flush = interval_at(
        Instant::now() + config.flush_interval,
        config.flush_interval,
    );
    flush.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut health = interval_at(
        Instant::now() + config.health_interval,
        config.health_interval,
    );
    health.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            message = in_rx.recv() => match message {
                Some(Inbound::Event(event)) => tracker.handle_event(event).await,
                Some(Inbound::Request { id, request }) => {
                    let response = tracker.handle_request(request).await;
                    if out_tx.send(Outbound::Response { id, response }).is_err() {
                        tracing::warn!("Extension output closed");
                        break;
                    }
                }
                None => break,
            },
            _ = flush.tick() => tracker.flush().await,
            _ = health.tick() => tracker.health_check(),
        }
    }

    tracing::info!("Extension disconnected, shutting down");
    tracker.shutdown().await;

    reader_task.abort();
    let _ = reader_task.await;
    // The writer drains once every sender is gone.
    drop(tracker);
    drop(out_tx);
    writer_task.await??;
    Ok(())
}

async fn read_loop<R>(mut reader: R, tx: mpsc::Sender<Inbound>)
where
    R: AsyncRead + Unpin,
{
    loop {
        let bytes = match read_frame(&mut reader).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read from extension");
                break;
            }
        };

        match serde_json::from_slice::<Inbound>(&bytes) {
            Ok(message) => {
                if tx.send(message).await.is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring malformed message"),
        }
    }
}

async fn write_loop<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
) -> Result<(), TrackerError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        write_message(&mut writer, &message).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::messages::Request;
    use serde_json::{json, Value};
    use std::time::Duration;

    #[tokio::test]
    async fn test_frame_layout() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"{}").await.unwrap();
        assert_eq!(&buf[..4], &2u32.to_ne_bytes());
        assert_eq!(&buf[4..], b"{}");

        let mut reader = &buf[..];
        assert_eq!(read_frame(&mut reader).await.unwrap().unwrap(), b"{}");
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_is_rejected() {
        let header = ((MAX_FRAME_LEN + 1) as u32).to_ne_bytes();
        let mut reader = &header[..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, TrackerError::Frame(_)));
    }

    #[tokio::test]
    async fn test_read_message_decodes_request() {
        let mut buf = Vec::new();
        write_message(
            &mut buf,
            &json!({"type": "request", "id": 3, "request": {"action": "getBlockedSites"}}),
        )
        .await
        .unwrap();

        let mut reader = &buf[..];
        let message = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(
            message,
            Inbound::Request {
                id: 3,
                request: Request::GetBlockedSites
            }
        );
    }

    async fn next_response<R: AsyncRead + Unpin>(reader: &mut R, id: u64) -> Value {
        loop {
            let bytes = read_frame(reader).await.unwrap().expect("host closed");
            let value: Value = serde_json::from_slice(&bytes).unwrap();
            if value["type"] == "response" && value["id"] == id {
                return value["response"].clone();
            }
        }
    }

    #[tokio::test]
    async fn test_host_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrackerConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            state_path: dir.path().join("state.json"),
            flush_interval: Duration::from_secs(60),
            health_interval: Duration::from_secs(60),
        };

        let (client, host) = tokio::io::duplex(64 * 1024);
        let (host_read, host_write) = tokio::io::split(host);
        let session = tokio::spawn(async move { run(&config, host_read, host_write).await });

        let (mut client_read, mut client_write) = tokio::io::split(client);
        let snapshot = json!({
            "type": "event",
            "event": "snapshot",
            "tabs": [{"id": 7, "url": "https://docs.rs/tokio", "title": "tokio"}],
            "activeTabId": 7
        });
        write_message(&mut client_write, &snapshot).await.unwrap();
        write_message(
            &mut client_write,
            &json!({"type": "request", "id": 1, "request": {"action": "getCurrentTab"}}),
        )
        .await
        .unwrap();

        let response = next_response(&mut client_read, 1).await;
        assert_eq!(response["currentTabId"], 7);
        assert_eq!(response["isTracking"], true);

        // A blocked navigation is answered with an interstitial redirect.
        let blocked = json!({
            "type": "event",
            "event": "updated",
            "tab": {"id": 7, "url": "https://www.youtube.com/", "title": ""},
            "change": {"url": "https://www.youtube.com/"}
        });
        write_message(&mut client_write, &blocked).await.unwrap();
        loop {
            let bytes = read_frame(&mut client_read).await.unwrap().unwrap();
            let value: Value = serde_json::from_slice(&bytes).unwrap();
            if value["command"] == "navigate" {
                assert_eq!(value["tabId"], 7);
                assert!(value["url"].as_str().unwrap().starts_with("data:text/html"));
                break;
            }
        }

        client_write.shutdown().await.unwrap();
        session.await.unwrap().unwrap();
        assert!(dir.path().join("state.json").exists());
    }
}

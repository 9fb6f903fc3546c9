//! Live-update subscriber.
//!
//! Holds exactly one server-sent-event connection per subscription and
//! invokes the callback once per inbound message, in arrival order. The
//! payload is never parsed or branched on: any message is a coarse
//! "something changed, re-sync" signal. On error or end-of-stream the
//! connection is dropped first, then a fresh one is opened after a fixed
//! delay; missed events are never replayed — the next message simply cues a
//! full re-fetch.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::header::ACCEPT;
use tokio::sync::Notify;
use tokio_stream::StreamExt;

use crate::sse::{SseMessage, SseParser};

pub type OnMessage = Arc<dyn Fn(SseMessage) + Send + Sync>;

/// Delay between reconnect attempts. Fixed, no adaptive backoff; mirrors the
/// browser EventSource default.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Handle owning the subscription. `close()` (or drop) tears the connection
/// down deterministically; no message is delivered afterwards.
#[derive(Debug)]
pub struct LiveUpdateHandle {
    shutdown: Arc<Notify>,
    task: tokio::task::JoinHandle<()>,
}

impl LiveUpdateHandle {
    pub fn close(&self) {
        self.shutdown.notify_waiters();
        self.task.abort();
    }
}

impl Drop for LiveUpdateHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn subscribe(http: reqwest::Client, url: String, on_message: OnMessage) -> LiveUpdateHandle {
    subscribe_with_retry(http, url, DEFAULT_RETRY_DELAY, on_message)
}

pub fn subscribe_with_retry(
    http: reqwest::Client,
    url: String,
    retry_delay: Duration,
    on_message: OnMessage,
) -> LiveUpdateHandle {
    let shutdown = Arc::new(Notify::new());
    let task = tokio::spawn(run(http, url, retry_delay, on_message, shutdown.clone()));
    LiveUpdateHandle { shutdown, task }
}

async fn run(
    http: reqwest::Client,
    url: String,
    retry_delay: Duration,
    on_message: OnMessage,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            res = pump(&http, &url, &on_message) => match res {
                Ok(()) => tracing::info!(%url, "live update stream ended"),
                Err(e) => tracing::warn!(%url, "live update stream error: {e:#}"),
            }
        }

        // The old connection is already dropped here; only then is a
        // reconnect scheduled.
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = tokio::time::sleep(retry_delay) => {}
        }
    }
    tracing::debug!(%url, "live update subscriber closed");
}

/// One connection lifetime: open, then deliver messages until the stream
/// errors or ends.
async fn pump(http: &reqwest::Client, url: &str, on_message: &OnMessage) -> anyhow::Result<()> {
    let response = http
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await
        .context("failed to open live update stream")?;
    anyhow::ensure!(
        response.status().is_success(),
        "live update stream answered {}",
        response.status()
    );
    tracing::info!(%url, "live update stream open");

    let mut parser = SseParser::default();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("live update stream read failed")?;
        for message in parser.feed(&chunk) {
            on_message(message);
        }
    }
    Ok(())
}

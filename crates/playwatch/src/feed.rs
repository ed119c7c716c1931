//! Event feed subscriber.
//!
//! Keeps one WebSocket subscription open until its [`FeedHandle`] is shut
//! down. Every frame is decoded as JSON and handed to the tracker; frames
//! that do not decode are logged and skipped. When the connection drops,
//! the subscriber records why, waits the configured delay, and
//! reconnects. Shutdown sends a close frame on the open connection.

use std::sync::Arc;

use playwatch_protocol::{Codec, JsonCodec};
use playwatch_transport::{TransportError, WebSocketFeed};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::FeedConfig;
use crate::source::SourceStatus;
use crate::tracker::Tracker;

/// Spawns the subscriber task.
pub fn spawn_feed(
    url: String,
    config: FeedConfig,
    tracker: Arc<Tracker>,
    status: SourceStatus,
) -> FeedHandle {
    let (stop, stop_rx) = watch::channel(false);
    let subscriber = FeedSubscriber {
        url,
        config,
        tracker,
        status,
        codec: JsonCodec,
    };
    FeedHandle {
        stop,
        task: tokio::spawn(subscriber.run(stop_rx)),
    }
}

/// Handle to a running subscriber task.
///
/// Dropping the handle also stops the subscriber.
pub struct FeedHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// Stops the subscriber, closing the open connection if there is
    /// one, and waits for the task to finish.
    pub async fn shutdown(self) {
        self.stop.send_replace(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "feed subscriber task failed");
        }
    }
}

/// Resolves once a stop was requested or the handle is gone.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    while !*stop.borrow_and_update() {
        if stop.changed().await.is_err() {
            return;
        }
    }
}

struct FeedSubscriber {
    url: String,
    config: FeedConfig,
    tracker: Arc<Tracker>,
    status: SourceStatus,
    codec: JsonCodec,
}

impl FeedSubscriber {
    async fn run(self, mut stop: watch::Receiver<bool>) {
        let mut ever_connected = false;

        loop {
            let connected = tokio::select! {
                result = self.connect() => result,
                _ = stopped(&mut stop) => break,
            };

            match connected {
                Ok(mut feed) => {
                    if ever_connected {
                        tracing::debug!(id = %feed.id(), url = %self.url, "reconnected to event feed");
                    } else {
                        tracing::info!(id = %feed.id(), url = %self.url, "connected to event feed");
                        ever_connected = true;
                    }
                    self.status.set_connected();

                    let ended = tokio::select! {
                        reason = self.pump(&mut feed) => Some(reason),
                        _ = stopped(&mut stop) => None,
                    };
                    let Some(reason) = ended else {
                        if let Err(e) = feed.close().await {
                            tracing::debug!(id = %feed.id(), error = %e, "event feed close failed");
                        }
                        break;
                    };

                    match &reason {
                        Some(error) => {
                            tracing::warn!(id = %feed.id(), error = %error, "event feed lost")
                        }
                        None => tracing::info!(id = %feed.id(), "event feed closed by remote"),
                    }
                    self.status.set_disconnected(reason);
                }
                Err(e) => {
                    tracing::error!(url = %self.url, error = %e, "event feed connection failed");
                    self.status.set_disconnected(Some(e));
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay()) => {}
                _ = stopped(&mut stop) => break,
            }
        }

        self.status.set_disconnected(None);
        tracing::info!(url = %self.url, "event feed subscriber stopped");
    }

    async fn connect(&self) -> Result<WebSocketFeed, String> {
        match tokio::time::timeout(self.config.connect_timeout(), WebSocketFeed::connect(&self.url))
            .await
        {
            Ok(result) => result.map_err(|e: TransportError| e.to_string()),
            Err(_) => Err(format!(
                "connect to {} timed out after {}ms",
                self.url, self.config.connect_timeout_ms
            )),
        }
    }

    /// Forwards frames until the feed ends. Returns the error message, or
    /// `None` for a clean close.
    async fn pump(&self, feed: &mut WebSocketFeed) -> Option<String> {
        loop {
            let frame = match feed.recv().await {
                Ok(Some(frame)) => frame,
                Ok(None) => return None,
                Err(e) => return Some(e.to_string()),
            };

            let raw: Value = match self.codec.decode(&frame) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!(id = %feed.id(), error = %e, "failed to decode feed frame");
                    continue;
                }
            };

            // Rejections are logged by the tracker.
            let _ = self.tracker.process_event(&raw).await;
        }
    }
}

//! Event feed transports for Playwatch.
//!
//! A feed is a long-lived subscription that pushes one JSON event per
//! frame, the broker-style alternative to HTTP push. This crate only
//! moves bytes; decoding and validation happen in the layers above.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket feeds via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketFeed;

use std::fmt;

/// Opaque identifier for one feed connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedId(u64);

impl FeedId {
    /// Creates a new `FeedId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feed-{}", self.0)
    }
}

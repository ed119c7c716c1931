//! Connection state of the configured event source.

use serde::Serialize;
use tokio::sync::watch;

use crate::config::EventSourceKind;

/// Point-in-time view of the event source, as reported by
/// `GET /api/player-data`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceState {
    pub connected: bool,
    /// Message of the most recent connection failure, cleared on
    /// reconnect.
    pub error: Option<String>,
}

/// Shared, cheaply cloneable status cell.
///
/// The feed subscriber writes it; request handlers read it. Backed by a
/// `watch` channel so readers never block the writer.
#[derive(Debug, Clone)]
pub struct SourceStatus {
    kind: EventSourceKind,
    state: watch::Sender<SourceState>,
}

impl SourceStatus {
    pub fn new(kind: EventSourceKind) -> Self {
        let (state, _) = watch::channel(SourceState::default());
        Self { kind, state }
    }

    pub fn kind(&self) -> EventSourceKind {
        self.kind
    }

    pub fn current(&self) -> SourceState {
        self.state.borrow().clone()
    }

    pub fn set_connected(&self) {
        self.state.send_replace(SourceState {
            connected: true,
            error: None,
        });
    }

    /// Marks the source down. `error` of `None` means a clean close.
    pub fn set_disconnected(&self, error: Option<String>) {
        self.state.send_replace(SourceState {
            connected: false,
            error,
        });
    }
}

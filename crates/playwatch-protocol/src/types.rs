//! Core event types.
//!
//! Everything here is the *normalized* form of an event: it has already
//! passed [`validate`](crate::validate), so required fields are present,
//! strings are trimmed and clamped, and the timestamp was assigned by us.
//!
//! Serialized, an event looks exactly like the wire form it came from:
//!
//! ```json
//! { "type": "PLAYER_CONNECTED", "playerName": "Alice",
//!   "worldName": "Bedrock level", "timestamp": "2024-05-01T12:00:00Z" }
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The five recognized lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    PlayerConnected,
    PlayerDisconnected,
    ServerStarted,
    ServerStopped,
    BackupComplete,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [EventKind; 5] = [
        Self::PlayerConnected,
        Self::PlayerDisconnected,
        Self::ServerStarted,
        Self::ServerStopped,
        Self::BackupComplete,
    ];

    /// The wire name, e.g. `"PLAYER_CONNECTED"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlayerConnected => "PLAYER_CONNECTED",
            Self::PlayerDisconnected => "PLAYER_DISCONNECTED",
            Self::ServerStarted => "SERVER_STARTED",
            Self::ServerStopped => "SERVER_STOPPED",
            Self::BackupComplete => "BACKUP_COMPLETE",
        }
    }

    /// Looks up a kind by its exact wire name.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Returns `true` for the kinds that require a `playerName`.
    pub fn is_player_event(self) -> bool {
        matches!(self, Self::PlayerConnected | Self::PlayerDisconnected)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Fields carried by the two player event kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDetails {
    /// Trimmed, non-empty, at most 50 characters.
    #[serde(rename = "playerName")]
    pub name: String,

    /// Opaque platform identifier.
    #[serde(rename = "playerXuid", default, skip_serializing_if = "Option::is_none")]
    pub xuid: Option<String>,

    #[serde(rename = "worldName", default, skip_serializing_if = "Option::is_none")]
    pub world: Option<String>,

    /// Container name with any leading `/` already stripped.
    #[serde(rename = "containerName", default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// Fields carried by server-level events (start, stop, backup).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDetails {
    #[serde(rename = "worldName", default, skip_serializing_if = "Option::is_none")]
    pub world: Option<String>,

    #[serde(rename = "containerName", default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// The body of an event, one variant per [`EventKind`].
///
/// Player variants always carry a [`PlayerDetails`], so "missing player
/// name" is not representable past validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    PlayerConnected(PlayerDetails),
    PlayerDisconnected(PlayerDetails),
    ServerStarted(ServerDetails),
    ServerStopped(ServerDetails),
    BackupComplete(ServerDetails),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PlayerConnected(_) => EventKind::PlayerConnected,
            Self::PlayerDisconnected(_) => EventKind::PlayerDisconnected,
            Self::ServerStarted(_) => EventKind::ServerStarted,
            Self::ServerStopped(_) => EventKind::ServerStopped,
            Self::BackupComplete(_) => EventKind::BackupComplete,
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A validated lifecycle event stamped with its receipt time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    pub payload: EventPayload,

    /// When the ingesting boundary received the event. Never taken from
    /// the sender.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// The player this event is about, if it is a player event.
    pub fn player(&self) -> Option<&PlayerDetails> {
        match &self.payload {
            EventPayload::PlayerConnected(p) | EventPayload::PlayerDisconnected(p) => Some(p),
            _ => None,
        }
    }

    /// World name, whichever kind of event carries it.
    pub fn world(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::PlayerConnected(p) | EventPayload::PlayerDisconnected(p) => {
                p.world.as_deref()
            }
            EventPayload::ServerStarted(s)
            | EventPayload::ServerStopped(s)
            | EventPayload::BackupComplete(s) => s.world.as_deref(),
        }
    }
}

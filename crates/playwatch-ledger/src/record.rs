//! Player records: the one durable unit of state.
//!
//! A record is created the first time a player connects and is never
//! deleted. There is no separate "session" entity: an open session is
//! just `session_start` being set, and closing it folds its length into
//! the duration fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PlayTime;

// ---------------------------------------------------------------------------
// PlayerStatus
// ---------------------------------------------------------------------------

/// Whether a player is currently on the server.
///
/// ```text
///   (absent) ──CONNECTED──→ Online ──DISCONNECTED──→ Disconnected
///                             ↑ │                         │
///                             └─┘ CONNECTED (restart)     │
///                             ↑                           │
///                             └────────CONNECTED──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Online,
    Disconnected,
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerRecord
// ---------------------------------------------------------------------------

/// Everything known about one player, keyed by name.
///
/// Serializes with the field names dashboards and snapshot files expect
/// (`lastSeen`, `playedDuration`, ...). Durations serialize as
/// `"{h}h {m}m {s}s"`. `session_start` is process-local and never
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub name: String,

    pub status: PlayerStatus,

    /// Timestamp of the most recent event for this player.
    pub last_seen: DateTime<Utc>,

    #[serde(default)]
    pub xuid: Option<String>,

    /// Last known world. Sticky: an event without one keeps the old value.
    #[serde(default)]
    pub world: Option<String>,

    /// Last known container. Sticky like `world`.
    #[serde(default)]
    pub container: Option<String>,

    /// Total across all completed sessions. Never decreases.
    #[serde(default)]
    pub played_duration: PlayTime,

    /// Length of the most recently completed session.
    #[serde(default)]
    pub last_duration: PlayTime,

    /// Length of the open session as of the last cache refresh. Zero
    /// while disconnected.
    #[serde(default)]
    pub current_session_duration: PlayTime,

    #[serde(skip)]
    pub(crate) session_start: Option<DateTime<Utc>>,
}

impl PlayerRecord {
    /// A brand-new record for a player's first connection.
    pub(crate) fn first_seen(name: String, at: DateTime<Utc>) -> Self {
        Self {
            name,
            status: PlayerStatus::Online,
            last_seen: at,
            xuid: None,
            world: None,
            container: None,
            played_duration: PlayTime::ZERO,
            last_duration: PlayTime::ZERO,
            current_session_duration: PlayTime::ZERO,
            session_start: Some(at),
        }
    }

    /// When the open session started, if there is one.
    pub fn session_start(&self) -> Option<DateTime<Utc>> {
        self.session_start
    }

    pub fn is_online(&self) -> bool {
        self.status == PlayerStatus::Online
    }

    /// Recomputes `current_session_duration` against `now`. Does nothing
    /// for players without an open session.
    pub fn refresh_current_session(&mut self, now: DateTime<Utc>) {
        if let (PlayerStatus::Online, Some(start)) = (self.status, self.session_start) {
            self.current_session_duration = PlayTime::between(start, now);
        }
    }

    /// Forces the record offline without crediting the open session.
    ///
    /// Used when restoring from a snapshot: a restarted process cannot
    /// know whether the player is still connected.
    pub fn mark_offline(&mut self) {
        self.status = PlayerStatus::Disconnected;
        self.current_session_duration = PlayTime::ZERO;
        self.session_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_seen_starts_online_with_zero_durations() {
        let record = PlayerRecord::first_seen("Alice".into(), at(0));
        assert!(record.is_online());
        assert_eq!(record.session_start(), Some(at(0)));
        assert_eq!(record.played_duration, PlayTime::ZERO);
        assert_eq!(record.current_session_duration, PlayTime::ZERO);
    }

    #[test]
    fn test_refresh_current_session_ignores_offline_players() {
        let mut record = PlayerRecord::first_seen("Alice".into(), at(0));
        record.mark_offline();
        record.refresh_current_session(at(600));
        assert_eq!(record.current_session_duration, PlayTime::ZERO);
    }

    #[test]
    fn test_mark_offline_keeps_played_duration() {
        let mut record = PlayerRecord::first_seen("Alice".into(), at(0));
        record.played_duration = PlayTime::from_millis(42_000);
        record.refresh_current_session(at(30));

        record.mark_offline();

        assert_eq!(record.status, PlayerStatus::Disconnected);
        assert_eq!(record.current_session_duration, PlayTime::ZERO);
        assert_eq!(record.session_start(), None);
        assert_eq!(record.played_duration.as_millis(), 42_000);
    }

    #[test]
    fn test_record_serializes_without_session_start() {
        let record = PlayerRecord::first_seen("Alice".into(), at(0));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["status"], "online");
        assert_eq!(json["playedDuration"], "0h 0m 0s");
        assert_eq!(json["currentSessionDuration"], "0h 0m 0s");
        assert!(json.get("sessionStart").is_none());
        assert!(json.get("session_start").is_none());
    }

    #[test]
    fn test_record_deserializes_with_missing_optional_fields() {
        let record: PlayerRecord = serde_json::from_value(serde_json::json!({
            "name": "Bob",
            "status": "disconnected",
            "lastSeen": "2024-05-01T12:00:00Z",
            "playedDuration": "2h 0m 5s",
        }))
        .unwrap();

        assert_eq!(record.played_duration.as_millis(), 7_205_000);
        assert_eq!(record.last_duration, PlayTime::ZERO);
        assert_eq!(record.world, None);
        assert_eq!(record.session_start(), None);
    }
}

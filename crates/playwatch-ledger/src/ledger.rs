//! The session ledger: turns validated events into record mutations.
//!
//! This is the only place session arithmetic happens. Given the same
//! record map and the same event, [`SessionLedger::apply`] always
//! produces the same result; timestamps come from the event, never from
//! the wall clock.
//!
//! # Concurrency note
//!
//! `SessionLedger` is NOT thread-safe by itself. It is owned by the
//! presence cache, which in turn sits behind the tracker's mutex, so
//! events are applied one at a time in arrival order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use playwatch_protocol::{Event, EventPayload, PlayerDetails};

use crate::{PlayTime, PlayerRecord, PlayerStatus};

/// What [`SessionLedger::apply`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A first-time player came online.
    Joined,
    /// A known, offline player came back online.
    SessionStarted,
    /// An online player connected again without disconnecting. The open
    /// session was discarded and a new one started.
    SessionRestarted,
    /// An open session was closed and credited.
    SessionClosed { duration: PlayTime },
    /// Disconnect with no open session: only `last_seen` moved.
    Seen,
    /// Nothing changed (server events, disconnects from unknown players).
    Unchanged,
}

impl Applied {
    /// Returns `true` if any record was modified.
    pub fn mutated(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Per-player session bookkeeping.
#[derive(Debug, Default)]
pub struct SessionLedger {
    /// Keyed by player name. `BTreeMap` so reads come out sorted.
    records: BTreeMap<String, PlayerRecord>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from previously persisted records.
    ///
    /// Every record is forced offline: a restarted process cannot assume
    /// anyone is still connected. Duplicate names keep the last entry.
    pub fn restore(records: impl IntoIterator<Item = PlayerRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|mut record| {
                record.mark_offline();
                (record.name.clone(), record)
            })
            .collect();
        Self { records }
    }

    /// Applies one validated event.
    pub fn apply(&mut self, event: &Event) -> Applied {
        let at = event.timestamp;
        let applied = match &event.payload {
            EventPayload::PlayerConnected(player) => self.connect(player, at),
            EventPayload::PlayerDisconnected(player) => self.disconnect(player, at),
            EventPayload::ServerStarted(_)
            | EventPayload::ServerStopped(_)
            | EventPayload::BackupComplete(_) => Applied::Unchanged,
        };

        if let Some(player) = event.player() {
            tracing::debug!(
                player = %player.name,
                kind = %event.kind(),
                ?applied,
                "ledger applied event"
            );
        }
        applied
    }

    fn connect(&mut self, player: &PlayerDetails, at: DateTime<Utc>) -> Applied {
        let Some(record) = self.records.get_mut(&player.name) else {
            let mut record = PlayerRecord::first_seen(player.name.clone(), at);
            absorb_details(&mut record, player);
            self.records.insert(player.name.clone(), record);
            return Applied::Joined;
        };

        let applied = match record.status {
            // The previous open interval is dropped, not credited.
            PlayerStatus::Online => Applied::SessionRestarted,
            PlayerStatus::Disconnected => Applied::SessionStarted,
        };

        record.status = PlayerStatus::Online;
        record.session_start = Some(at);
        record.current_session_duration = PlayTime::ZERO;
        record.last_seen = at;
        absorb_details(record, player);
        applied
    }

    fn disconnect(&mut self, player: &PlayerDetails, at: DateTime<Utc>) -> Applied {
        let Some(record) = self.records.get_mut(&player.name) else {
            return Applied::Unchanged;
        };

        record.last_seen = at;

        // No open session: nothing but `last_seen` moves.
        let Some(start) = record.session_start.take() else {
            return Applied::Seen;
        };

        fill_missing_details(record, player);
        let duration = PlayTime::between(start, at);
        record.status = PlayerStatus::Disconnected;
        record.last_duration = duration;
        record.played_duration = record.played_duration.saturating_add(duration);
        record.current_session_duration = PlayTime::ZERO;
        Applied::SessionClosed { duration }
    }

    /// Recomputes the live `current_session_duration` of every online
    /// player against `now`. Completed-session fields are untouched.
    pub fn refresh_live(&mut self, now: DateTime<Utc>) {
        for record in self.records.values_mut() {
            record.refresh_current_session(now);
        }
    }

    pub fn get(&self, name: &str) -> Option<&PlayerRecord> {
        self.records.get(name)
    }

    /// All records, sorted by name.
    pub fn records(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.records.values()
    }

    pub fn online_count(&self) -> usize {
        self.records.values().filter(|r| r.is_online()).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Copies the optional identity fields an event carries. Absent fields
/// keep their previous value.
fn absorb_details(record: &mut PlayerRecord, player: &PlayerDetails) {
    if let Some(xuid) = &player.xuid {
        record.xuid = Some(xuid.clone());
    }
    if let Some(world) = &player.world {
        record.world = Some(world.clone());
    }
    if let Some(container) = &player.container {
        record.container = Some(container.clone());
    }
}

/// Like [`absorb_details`], but only fills fields the record lacks. A
/// disconnect never overrides what the connect established.
fn fill_missing_details(record: &mut PlayerRecord, player: &PlayerDetails) {
    if record.xuid.is_none() {
        record.xuid = player.xuid.clone();
    }
    if record.world.is_none() {
        record.world = player.world.clone();
    }
    if record.container.is_none() {
        record.container = player.container.clone();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionLedger`, named
    //! `test_{function}_{scenario}_{expected}`.

    use super::*;
    use playwatch_protocol::ServerDetails;

    // -- Helpers ----------------------------------------------------------

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn details(name: &str) -> PlayerDetails {
        PlayerDetails {
            name: name.into(),
            xuid: None,
            world: None,
            container: None,
        }
    }

    fn connected(name: &str, secs: i64) -> Event {
        Event {
            payload: EventPayload::PlayerConnected(details(name)),
            timestamp: at(secs),
        }
    }

    fn disconnected(name: &str, secs: i64) -> Event {
        Event {
            payload: EventPayload::PlayerDisconnected(details(name)),
            timestamp: at(secs),
        }
    }

    // =====================================================================
    // connect
    // =====================================================================

    #[test]
    fn test_apply_first_connect_creates_online_record() {
        let mut ledger = SessionLedger::new();

        let applied = ledger.apply(&connected("Alice", 0));

        assert_eq!(applied, Applied::Joined);
        let alice = ledger.get("Alice").expect("record should exist");
        assert_eq!(alice.status, PlayerStatus::Online);
        assert_eq!(alice.last_seen, at(0));
        assert_eq!(alice.session_start(), Some(at(0)));
        assert_eq!(alice.played_duration, PlayTime::ZERO);
        assert_eq!(alice.last_duration, PlayTime::ZERO);
    }

    #[test]
    fn test_apply_connect_copies_world_and_container() {
        let mut ledger = SessionLedger::new();
        let event = Event {
            payload: EventPayload::PlayerConnected(PlayerDetails {
                name: "Alice".into(),
                xuid: Some("2535".into()),
                world: Some("Survival".into()),
                container: Some("mc-1".into()),
            }),
            timestamp: at(0),
        };

        ledger.apply(&event);

        let alice = ledger.get("Alice").unwrap();
        assert_eq!(alice.xuid.as_deref(), Some("2535"));
        assert_eq!(alice.world.as_deref(), Some("Survival"));
        assert_eq!(alice.container.as_deref(), Some("mc-1"));
    }

    #[test]
    fn test_apply_reconnect_without_disconnect_credits_nothing() {
        let mut ledger = SessionLedger::new();
        ledger.apply(&connected("Alice", 0));

        let applied = ledger.apply(&connected("Alice", 600));

        assert_eq!(applied, Applied::SessionRestarted);
        let alice = ledger.get("Alice").unwrap();
        assert_eq!(alice.session_start(), Some(at(600)));
        assert_eq!(alice.played_duration, PlayTime::ZERO);

        // Only the new interval is credited on disconnect.
        ledger.apply(&disconnected("Alice", 630));
        let alice = ledger.get("Alice").unwrap();
        assert_eq!(alice.played_duration.to_string(), "0h 0m 30s");
    }

    #[test]
    fn test_apply_reconnect_without_disconnect_resets_current_session() {
        let mut ledger = SessionLedger::new();
        ledger.apply(&connected("Alice", 0));
        ledger.refresh_live(at(600));
        assert_eq!(ledger.get("Alice").unwrap().current_session_duration.to_string(), "0h 10m 0s");

        ledger.apply(&connected("Alice", 600));
        ledger.refresh_live(at(605));

        assert_eq!(ledger.get("Alice").unwrap().current_session_duration.to_string(), "0h 0m 5s");
    }

    // =====================================================================
    // disconnect
    // =====================================================================

    #[test]
    fn test_apply_disconnect_closes_session() {
        let mut ledger = SessionLedger::new();
        ledger.apply(&connected("Alice", 0));

        let applied = ledger.apply(&disconnected("Alice", 90));

        assert_eq!(
            applied,
            Applied::SessionClosed {
                duration: PlayTime::from_millis(90_000)
            }
        );
        let alice = ledger.get("Alice").unwrap();
        assert_eq!(alice.status, PlayerStatus::Disconnected);
        assert_eq!(alice.played_duration.to_string(), "0h 1m 30s");
        assert_eq!(alice.last_duration.to_string(), "0h 1m 30s");
        assert_eq!(alice.current_session_duration, PlayTime::ZERO);
        assert_eq!(alice.session_start(), None);
        assert_eq!(alice.last_seen, at(90));
    }

    #[test]
    fn test_apply_duplicate_disconnect_does_not_double_count() {
        let mut ledger = SessionLedger::new();
        ledger.apply(&connected("Alice", 0));
        ledger.apply(&disconnected("Alice", 90));

        let applied = ledger.apply(&disconnected("Alice", 90));

        assert_eq!(applied, Applied::Seen);
        let alice = ledger.get("Alice").unwrap();
        assert_eq!(alice.played_duration.to_string(), "0h 1m 30s");
        assert_eq!(alice.last_duration.to_string(), "0h 1m 30s");
    }

    #[test]
    fn test_apply_late_disconnect_only_moves_last_seen() {
        let mut ledger = SessionLedger::new();
        ledger.apply(&connected("Alice", 0));
        ledger.apply(&disconnected("Alice", 90));

        ledger.apply(&disconnected("Alice", 500));

        let alice = ledger.get("Alice").unwrap();
        assert_eq!(alice.last_seen, at(500));
        assert_eq!(alice.played_duration.to_string(), "0h 1m 30s");
    }

    #[test]
    fn test_apply_disconnect_unknown_player_is_unchanged() {
        let mut ledger = SessionLedger::new();

        let applied = ledger.apply(&disconnected("Ghost", 10));

        assert_eq!(applied, Applied::Unchanged);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_apply_disconnect_keeps_sticky_world() {
        let mut ledger = SessionLedger::new();
        ledger.apply(&Event {
            payload: EventPayload::PlayerConnected(PlayerDetails {
                world: Some("Survival".into()),
                ..details("Alice")
            }),
            timestamp: at(0),
        });

        ledger.apply(&disconnected("Alice", 10));

        assert_eq!(ledger.get("Alice").unwrap().world.as_deref(), Some("Survival"));
    }

    fn disconnected_with(name: &str, world: &str, container: &str, secs: i64) -> Event {
        Event {
            payload: EventPayload::PlayerDisconnected(PlayerDetails {
                world: Some(world.into()),
                container: Some(container.into()),
                ..details(name)
            }),
            timestamp: at(secs),
        }
    }

    #[test]
    fn test_apply_disconnect_with_other_world_keeps_connect_details() {
        let mut ledger = SessionLedger::new();
        ledger.apply(&Event {
            payload: EventPayload::PlayerConnected(PlayerDetails {
                world: Some("Survival".into()),
                container: Some("mc-1".into()),
                ..details("Alice")
            }),
            timestamp: at(0),
        });

        let closed = ledger.apply(&disconnected_with("Alice", "Lobby", "mc-2", 60));
        let seen = ledger.apply(&disconnected_with("Alice", "Elsewhere", "mc-3", 90));

        assert!(matches!(closed, Applied::SessionClosed { .. }));
        assert_eq!(seen, Applied::Seen);
        let alice = ledger.get("Alice").unwrap();
        assert_eq!(alice.world.as_deref(), Some("Survival"));
        assert_eq!(alice.container.as_deref(), Some("mc-1"));
        assert_eq!(alice.last_seen, at(90));
        assert_eq!(alice.played_duration.to_string(), "0h 1m 0s");
    }

    #[test]
    fn test_apply_closing_disconnect_fills_missing_world() {
        let mut ledger = SessionLedger::new();
        ledger.apply(&connected("Bob", 0));

        ledger.apply(&disconnected_with("Bob", "Creative", "mc-1", 30));

        let bob = ledger.get("Bob").unwrap();
        assert_eq!(bob.world.as_deref(), Some("Creative"));
        assert_eq!(bob.container.as_deref(), Some("mc-1"));
    }

    #[test]
    fn test_apply_seen_disconnect_moves_only_last_seen() {
        let mut ledger = SessionLedger::restore([PlayerRecord::first_seen("Carol".into(), at(0))]);
        let before = ledger.get("Carol").unwrap().clone();

        let applied = ledger.apply(&disconnected_with("Carol", "Lobby", "mc-9", 45));

        assert_eq!(applied, Applied::Seen);
        let carol = ledger.get("Carol").unwrap();
        assert_eq!(carol.last_seen, at(45));
        assert_eq!(carol.world, None);
        assert_eq!(carol.container, None);
        assert_eq!(carol.played_duration, before.played_duration);
        assert_eq!(carol.status, PlayerStatus::Disconnected);
    }

    #[test]
    fn test_apply_many_sessions_sum_exactly() {
        let mut ledger = SessionLedger::new();
        let sessions = [(0, 45), (100, 3_700), (4_000, 4_001), (10_000, 10_000)];
        let mut expected_ms = 0;

        for (start, end) in sessions {
            ledger.apply(&connected("Alice", start));
            ledger.apply(&disconnected("Alice", end));
            expected_ms += (end - start) as u64 * 1_000;
        }

        let alice = ledger.get("Alice").unwrap();
        assert_eq!(alice.played_duration.as_millis(), expected_ms);
        assert_eq!(alice.played_duration.to_string(), "1h 0m 46s");
        assert_eq!(alice.last_duration, PlayTime::ZERO);
    }

    #[test]
    fn test_apply_sub_second_remainders_accumulate() {
        let mut ledger = SessionLedger::new();
        let base = at(0);
        let half = chrono::Duration::milliseconds(500);

        for i in 0..4 {
            let start = base + chrono::Duration::seconds(i * 10);
            ledger.apply(&Event {
                payload: EventPayload::PlayerConnected(details("Alice")),
                timestamp: start,
            });
            ledger.apply(&Event {
                payload: EventPayload::PlayerDisconnected(details("Alice")),
                timestamp: start + half,
            });
        }

        // Four half-second sessions are two whole seconds, not zero.
        assert_eq!(ledger.get("Alice").unwrap().played_duration.to_string(), "0h 0m 2s");
    }

    // =====================================================================
    // server events, restore, refresh
    // =====================================================================

    #[test]
    fn test_apply_server_events_touch_no_records() {
        let mut ledger = SessionLedger::new();
        ledger.apply(&connected("Alice", 0));

        for payload in [
            EventPayload::ServerStarted(ServerDetails::default()),
            EventPayload::ServerStopped(ServerDetails::default()),
            EventPayload::BackupComplete(ServerDetails::default()),
        ] {
            let applied = ledger.apply(&Event {
                payload,
                timestamp: at(50),
            });
            assert_eq!(applied, Applied::Unchanged);
            assert!(!applied.mutated());
        }

        let alice = ledger.get("Alice").unwrap();
        assert_eq!(alice.last_seen, at(0));
        assert!(alice.is_online());
    }

    #[test]
    fn test_restore_forces_everyone_offline() {
        let mut live = SessionLedger::new();
        live.apply(&connected("Alice", 0));
        live.apply(&connected("Bob", 0));
        live.apply(&disconnected("Bob", 60));
        live.refresh_live(at(120));
        let saved: Vec<PlayerRecord> = live.records().cloned().collect();

        let restored = SessionLedger::restore(saved);

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.online_count(), 0);
        let alice = restored.get("Alice").unwrap();
        assert_eq!(alice.status, PlayerStatus::Disconnected);
        assert_eq!(alice.current_session_duration, PlayTime::ZERO);
        assert_eq!(restored.get("Bob").unwrap().played_duration.to_string(), "0h 1m 0s");
    }

    #[test]
    fn test_restored_player_disconnect_is_seen_only() {
        let mut live = SessionLedger::new();
        live.apply(&connected("Alice", 0));
        let mut restored = SessionLedger::restore(live.records().cloned().collect::<Vec<_>>());

        let applied = restored.apply(&disconnected("Alice", 300));

        assert_eq!(applied, Applied::Seen);
        assert_eq!(restored.get("Alice").unwrap().played_duration, PlayTime::ZERO);
    }

    #[test]
    fn test_records_are_sorted_by_name() {
        let mut ledger = SessionLedger::new();
        for name in ["carol", "Alice", "bob"] {
            ledger.apply(&connected(name, 0));
        }
        let names: Vec<&str> = ledger.records().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Alice", "bob", "carol"]);
    }
}

//! The tracker: single entry point for every event source and reader.
//!
//! HTTP push and the feed subscriber both call
//! [`Tracker::process_event`]; query handlers call [`Tracker::players`].
//! All state sits behind one async mutex, so events are validated,
//! timestamped, and applied strictly one at a time in arrival order.
//! Snapshot writes are handed to the writer task and never awaited here.

use chrono::{DateTime, Utc};
use playwatch_ledger::{PlayerRecord, SessionLedger};
use playwatch_presence::{EventLog, PresenceCache, PresenceConfig};
use playwatch_protocol::{validate, Event, ValidationError};
use playwatch_store::{Snapshot, SnapshotHandle, StoreError};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

/// Result of a presence query.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    /// Every known player, sorted by name.
    pub players: Vec<PlayerRecord>,
    /// When the query was answered.
    pub timestamp: DateTime<Utc>,
}

/// Everything guarded by the tracker's lock.
struct TrackerState {
    presence: PresenceCache,
    log: EventLog,
}

/// Owns the presence cache and routes persistence to the writer task.
pub struct Tracker {
    state: Mutex<TrackerState>,
    snapshots: Option<SnapshotHandle>,
}

impl Tracker {
    /// Creates a tracker over `ledger`.
    ///
    /// With `snapshots` set, every mutating event queues a snapshot of
    /// the full record set; without it, nothing is persisted.
    pub fn new(
        ledger: SessionLedger,
        presence: PresenceConfig,
        event_log_capacity: usize,
        snapshots: Option<SnapshotHandle>,
    ) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                presence: PresenceCache::new(ledger, presence),
                log: EventLog::new(event_log_capacity),
            }),
            snapshots,
        }
    }

    /// Validates, timestamps, and applies one raw event.
    ///
    /// The timestamp is taken after the lock is acquired, so timestamps
    /// never run backwards relative to application order.
    ///
    /// # Errors
    /// Returns the [`ValidationError`] if the event is rejected. Nothing
    /// is mutated and nothing is persisted in that case.
    pub async fn process_event(&self, raw: &Value) -> Result<Event, ValidationError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        self.apply_locked(&mut state, raw, now)
    }

    /// Like [`process_event`](Self::process_event) with an explicit
    /// receipt time.
    ///
    /// # Errors
    /// Returns the [`ValidationError`] if the event is rejected.
    pub async fn process_event_at(
        &self,
        raw: &Value,
        received_at: DateTime<Utc>,
    ) -> Result<Event, ValidationError> {
        let mut state = self.state.lock().await;
        self.apply_locked(&mut state, raw, received_at)
    }

    fn apply_locked(
        &self,
        state: &mut TrackerState,
        raw: &Value,
        received_at: DateTime<Utc>,
    ) -> Result<Event, ValidationError> {
        let event = match validate(raw, received_at) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "event rejected");
                return Err(e);
            }
        };

        tracing::info!(
            kind = %event.kind(),
            player = event.player().map(|p| p.name.as_str()),
            world = event.world(),
            "event received"
        );

        let applied = state.presence.apply(&event);
        state.log.push(event.clone());

        let ledger = state.presence.ledger();
        tracing::debug!(
            players = ledger.len(),
            online = ledger.online_count(),
            outcome = ?applied,
            "players updated"
        );

        if applied.mutated() {
            self.persist(ledger, received_at);
        }

        Ok(event)
    }

    /// Queues a snapshot of `ledger`. Failures are logged, never returned.
    fn persist(&self, ledger: &SessionLedger, at: DateTime<Utc>) {
        let Some(snapshots) = &self.snapshots else {
            return;
        };
        let snapshot = Snapshot::new(ledger.records().cloned().collect(), at);
        if let Err(e) = snapshots.persist(snapshot) {
            tracing::error!(error = %e, "failed to queue snapshot");
        }
    }

    /// Returns every player with live session times at most one
    /// staleness window old.
    pub async fn players(&self) -> PlayerReport {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        PlayerReport {
            players: state.presence.read(now),
            timestamp: now,
        }
    }

    /// Like [`players`](Self::players) at an explicit time.
    pub async fn players_at(&self, now: DateTime<Utc>) -> PlayerReport {
        let mut state = self.state.lock().await;
        PlayerReport {
            players: state.presence.read(now),
            timestamp: now,
        }
    }

    /// Up to `limit` accepted events, newest first.
    pub async fn recent_events(&self, limit: usize) -> Vec<Event> {
        self.state.lock().await.log.recent(limit)
    }

    /// Waits for every queued snapshot to be written.
    ///
    /// # Errors
    /// [`StoreError::WriterClosed`] if the writer task is gone.
    pub async fn flush(&self) -> Result<(), StoreError> {
        match &self.snapshots {
            Some(snapshots) => snapshots.flush().await,
            None => Ok(()),
        }
    }
}

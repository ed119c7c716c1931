//! The presence cache.
//!
//! The cache *is* the ledger's storage: it owns the one
//! [`SessionLedger`] and every write goes through [`PresenceCache::apply`],
//! which is what lets it invalidate itself. There is never a second copy
//! of the records that could drift.

use chrono::{DateTime, Utc};
use playwatch_ledger::{Applied, PlayerRecord, SessionLedger};
use playwatch_protocol::Event;

use crate::PresenceConfig;

/// Serves the player list with live session times at most one staleness
/// window old.
#[derive(Debug)]
pub struct PresenceCache {
    ledger: SessionLedger,
    config: PresenceConfig,
    /// When live durations were last recomputed. `None` means "stale":
    /// either nothing was read yet or a write happened since.
    last_recomputed: Option<DateTime<Utc>>,
}

impl PresenceCache {
    pub fn new(ledger: SessionLedger, config: PresenceConfig) -> Self {
        Self {
            ledger,
            config,
            last_recomputed: None,
        }
    }

    /// Applies an event to the ledger. Any mutation invalidates the
    /// cache, so the next [`read`](Self::read) reflects it.
    pub fn apply(&mut self, event: &Event) -> Applied {
        let applied = self.ledger.apply(event);
        if applied.mutated() {
            self.invalidate();
        }
        applied
    }

    /// Forces the next read to recompute.
    pub fn invalidate(&mut self) {
        self.last_recomputed = None;
    }

    /// Returns a copy of every record, sorted by name.
    ///
    /// If the cache is stale at `now`, live session durations are
    /// recomputed first. Completed-session fields are never touched here.
    pub fn read(&mut self, now: DateTime<Utc>) -> Vec<PlayerRecord> {
        if self.is_stale(now) {
            self.ledger.refresh_live(now);
            self.last_recomputed = Some(now);
            tracing::trace!(
                players = self.ledger.len(),
                online = self.ledger.online_count(),
                "presence cache recomputed"
            );
        }
        self.ledger.records().cloned().collect()
    }

    /// Returns `true` if a read at `now` would recompute.
    ///
    /// A clock that moved backwards counts as stale.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_recomputed else {
            return true;
        };
        let elapsed_ms = (now - last).num_milliseconds();
        elapsed_ms < 0 || elapsed_ms as u128 > self.config.staleness_window.as_millis()
    }

    /// Read-only access to the underlying ledger (no recomputation).
    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }
}

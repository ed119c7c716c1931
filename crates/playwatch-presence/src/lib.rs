//! Read side of Playwatch.
//!
//! Pollers hit the player list every couple of seconds. Recomputing every
//! online player's live session time on each poll is wasted work, so the
//! [`PresenceCache`] only does it once per staleness window, and any
//! ledger write forces the next read to be fresh.
//!
//! # Key types
//!
//! - [`PresenceCache`]: owns the [`SessionLedger`](playwatch_ledger::SessionLedger)
//!   and serves copies of its records
//! - [`PresenceConfig`]: staleness window (default 5 s)
//! - [`EventLog`]: bounded, newest-first audit trail of accepted events

mod cache;
mod config;
mod event_log;

pub use cache::PresenceCache;
pub use config::PresenceConfig;
pub use event_log::{EventLog, DEFAULT_EVENT_LOG_CAPACITY};

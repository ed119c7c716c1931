//! Player session bookkeeping for Playwatch.
//!
//! This crate owns the state machine that turns lifecycle events into
//! per-player records:
//!
//! 1. **Records**: one [`PlayerRecord`] per player name, never deleted
//! 2. **Ledger**: [`SessionLedger::apply`] opens and closes sessions
//! 3. **Durations**: [`PlayTime`] and the `"{h}h {m}m {s}s"` text form
//!
//! # How it fits in the stack
//!
//! ```text
//! Presence cache (above)  ← serves records to readers, refreshes live time
//!     ↕
//! Ledger (this crate)  ← applies events, owns all duration arithmetic
//!     ↕
//! Protocol (below)  ← provides validated Event values
//! ```

mod duration;
mod ledger;
mod record;

pub use duration::{format_duration, parse_duration, PlayTime};
pub use ledger::{Applied, SessionLedger};
pub use record::{PlayerRecord, PlayerStatus};

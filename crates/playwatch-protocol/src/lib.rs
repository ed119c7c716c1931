//! Event protocol for Playwatch.
//!
//! This crate defines the "language" event sources speak to the tracker:
//!
//! - **Types** ([`Event`], [`EventPayload`], [`EventKind`]): the
//!   normalized lifecycle events the rest of the system consumes.
//! - **Validation** ([`validate`]): turns an untyped JSON record into a
//!   normalized [`Event`], or rejects it with a [`ValidationError`].
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how raw frames and
//!   snapshot files are converted to/from bytes.
//!
//! # Architecture
//!
//! The protocol layer sits between the event sources (HTTP push, feed
//! subscription) and the session ledger. It doesn't know about players
//! or durations; it only guarantees that nothing malformed gets past it.
//!
//! ```text
//! Event source (JSON) → Protocol (Event) → Ledger (player records)
//! ```

mod codec;
mod error;
mod types;
mod validate;

pub use codec::{Codec, JsonCodec};
pub use error::{ProtocolError, ValidationError};
pub use types::{Event, EventKind, EventPayload, PlayerDetails, ServerDetails};
pub use validate::{
    validate, MAX_CONTAINER_NAME_CHARS, MAX_PLAYER_NAME_CHARS, MAX_WORLD_NAME_CHARS,
};

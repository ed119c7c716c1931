//! Error types for the protocol layer.
//!
//! Each crate in Playwatch defines its own error enum. When you see a
//! `ValidationError`, you know the event itself was bad, not the disk or
//! the network.

use crate::EventKind;

/// Why a raw event was rejected by [`validate`](crate::validate).
///
/// A rejected event never reaches the ledger, so these errors are always
/// recoverable: the caller logs or reports them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The input was not a JSON object.
    #[error("event must be a JSON object")]
    NotAnObject,

    /// The `type` field is absent or not a string.
    #[error("event is missing a type")]
    MissingType,

    /// The `type` field is not one of the five recognized kinds.
    #[error("unknown event type: {0}")]
    UnknownType(String),

    /// A player event arrived without a usable `playerName`.
    #[error("{0} event requires a playerName")]
    MissingPlayerName(EventKind),

    /// A field is present but has the wrong JSON type
    /// (e.g. `worldName: 42`).
    #[error("field {0} has an invalid value")]
    InvalidField(&'static str),
}

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON or truncated frames.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

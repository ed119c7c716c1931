//! Event validation: untyped JSON in, normalized [`Event`] out.
//!
//! Validation is pure. It never touches shared state, so the ledger can
//! rely on one invariant: if it sees an event, the event is well formed.
//!
//! Overlong strings are truncated to the length caps (by characters, not
//! bytes) instead of being rejected.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{Event, EventKind, EventPayload, PlayerDetails, ServerDetails, ValidationError};

/// Maximum characters kept from `playerName`.
pub const MAX_PLAYER_NAME_CHARS: usize = 50;
/// Maximum characters kept from `worldName`.
pub const MAX_WORLD_NAME_CHARS: usize = 100;
/// Maximum characters kept from `containerName`.
pub const MAX_CONTAINER_NAME_CHARS: usize = 100;

/// Validates and normalizes a raw event.
///
/// `received_at` becomes the event's timestamp; any `timestamp` field in
/// `raw` is ignored.
///
/// # Errors
/// Returns a [`ValidationError`] describing the first problem found.
pub fn validate(raw: &Value, received_at: DateTime<Utc>) -> Result<Event, ValidationError> {
    let fields = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let type_name = fields
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingType)?;
    let kind = EventKind::from_wire(type_name)
        .ok_or_else(|| ValidationError::UnknownType(type_name.to_string()))?;

    let world = optional_text(fields, "worldName", MAX_WORLD_NAME_CHARS)?;
    let container = container_name(fields)?;

    let payload = if kind.is_player_event() {
        let name = optional_text(fields, "playerName", MAX_PLAYER_NAME_CHARS)?
            .ok_or(ValidationError::MissingPlayerName(kind))?;
        let details = PlayerDetails {
            name,
            xuid: xuid(fields)?,
            world,
            container,
        };
        match kind {
            EventKind::PlayerConnected => EventPayload::PlayerConnected(details),
            _ => EventPayload::PlayerDisconnected(details),
        }
    } else {
        let details = ServerDetails { world, container };
        match kind {
            EventKind::ServerStarted => EventPayload::ServerStarted(details),
            EventKind::ServerStopped => EventPayload::ServerStopped(details),
            _ => EventPayload::BackupComplete(details),
        }
    };

    Ok(Event {
        payload,
        timestamp: received_at,
    })
}

/// Reads an optional string field, trimming and clamping it.
///
/// Absent, `null`, and blank values all come back as `None`.
fn optional_text(
    fields: &Map<String, Value>,
    field: &'static str,
    max_chars: usize,
) -> Result<Option<String>, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.chars().take(max_chars).collect()))
            }
        }
        Some(_) => Err(ValidationError::InvalidField(field)),
    }
}

/// Xuids are opaque, and some servers report them as JSON numbers.
fn xuid(fields: &Map<String, Value>) -> Result<Option<String>, ValidationError> {
    match fields.get("playerXuid") {
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        _ => optional_text(fields, "playerXuid", usize::MAX),
    }
}

/// Container names are sometimes reported path-style (`/mc-survival`).
/// The separator is stripped before trimming and clamping, so it never
/// costs a character of the cap.
fn container_name(fields: &Map<String, Value>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = optional_text(fields, "containerName", usize::MAX)? else {
        return Ok(None);
    };
    let name = raw.strip_prefix('/').unwrap_or(&raw).trim();
    if name.is_empty() {
        return Ok(None);
    }
    Ok(Some(name.chars().take(MAX_CONTAINER_NAME_CHARS).collect()))
}

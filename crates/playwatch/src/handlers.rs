//! HTTP request handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use playwatch_ledger::PlayerRecord;
use playwatch_protocol::Event;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EventSourceKind;
use crate::error::ApiError;
use crate::source::SourceStatus;
use crate::tracker::Tracker;

/// Page size for `GET /api/events` when `limit` is absent.
const DEFAULT_EVENTS_LIMIT: usize = 100;
const MAX_EVENTS_LIMIT: usize = 1_000;

/// Shared state handed to every handler.
pub struct AppState {
    pub tracker: Arc<Tracker>,
    pub source: SourceStatus,
    /// Served verbatim by `GET /api/config`.
    pub ui: Value,
}

/// Body of `GET /api/player-data`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDataResponse {
    pub players: Vec<PlayerRecord>,
    pub timestamp: DateTime<Utc>,
    pub source_connected: bool,
    pub source_error: Option<String>,
    pub event_source: EventSourceKind,
}

pub async fn get_player_data(State(state): State<Arc<AppState>>) -> Json<PlayerDataResponse> {
    let report = state.tracker.players().await;
    let source = state.source.current();

    Json(PlayerDataResponse {
        players: report.players,
        timestamp: report.timestamp,
        source_connected: source.connected,
        source_error: source.error,
        event_source: state.source.kind(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.ui.clone())
}

/// Accepts one raw event.
///
/// The body is parsed by hand rather than through the `Json` extractor
/// so that malformed input gets the same `{error, status}` body as a
/// rejected event.
pub async fn post_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let raw: Value = serde_json::from_slice(&body)?;
    state.tracker.process_event(&raw).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Json<Vec<Event>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_EVENTS_LIMIT)
        .min(MAX_EVENTS_LIMIT);
    Json(state.tracker.recent_events(limit).await)
}

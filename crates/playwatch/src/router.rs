//! Axum router for the Playwatch HTTP API.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, AppState};

/// Builds the complete HTTP router.
///
/// - `GET  /api/player-data`: presence query
/// - `GET  /api/config`: display settings
/// - `POST /api/events`: push one raw event
/// - `GET  /api/events`: recently accepted events, newest first
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/player-data", get(handlers::get_player_data))
        .route("/api/config", get(handlers::get_config))
        .route(
            "/api/events",
            get(handlers::list_events).post(handlers::post_event),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

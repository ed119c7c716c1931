//! # Playwatch
//!
//! Player presence and session-duration tracker for game servers.
//!
//! Lifecycle events (player connected or disconnected, server started,
//! stopped, or backed up) arrive over HTTP push or a WebSocket feed. Each
//! one is validated, applied to a per-player session ledger, and the full
//! record set is snapshotted to disk. Readers get the player list with
//! live session times that are at most one staleness window old.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use playwatch::prelude::*;
//!
//! # async fn start() -> Result<(), PlaywatchError> {
//! let server = PlaywatchServer::builder()
//!     .config(PlaywatchConfig::load()?.0)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

pub mod config;
mod error;
pub mod feed;
pub mod handlers;
pub mod router;
mod server;
pub mod source;
pub mod tracker;

pub use error::{ApiError, PlaywatchError};
pub use server::{PlaywatchServer, PlaywatchServerBuilder};

pub mod prelude {
    pub use crate::config::{EventSourceKind, PlaywatchConfig};
    pub use crate::tracker::{PlayerReport, Tracker};
    pub use crate::{PlaywatchError, PlaywatchServer};
    pub use playwatch_ledger::{PlayTime, PlayerRecord, PlayerStatus};
    pub use playwatch_protocol::{Event, EventKind, ValidationError};
}

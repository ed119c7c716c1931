//! Snapshot persistence for Playwatch.
//!
//! The whole player set is written to one JSON file after every ledger
//! mutation and read back once at startup. Two pieces:
//!
//! - [`SnapshotStore`]: the file itself: atomic save, forgiving load
//! - [`SnapshotHandle`]: a writer actor so ingestion never waits on disk
//!
//! ```text
//! Tracker ──persist()──→ writer task ──save()──→ player-data.json
//! ```

mod error;
mod snapshot;
mod writer;

pub use error::StoreError;
pub use snapshot::{Snapshot, SnapshotStore};
pub use writer::{spawn_writer, SnapshotHandle};

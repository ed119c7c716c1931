//! Error types for the snapshot store.

use std::path::PathBuf;

use playwatch_protocol::ProtocolError;

/// Errors that can occur while saving or loading snapshots.
///
/// None of these are fatal: the in-memory ledger stays authoritative and
/// the failure is logged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading, writing, or renaming the snapshot file failed.
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be serialized, or the file on disk is not
    /// a valid snapshot.
    #[error("snapshot format error: {0}")]
    Format(#[from] ProtocolError),

    /// The writer task is gone (shut down or panicked).
    #[error("snapshot writer is unavailable")]
    WriterClosed,
}

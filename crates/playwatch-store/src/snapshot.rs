//! The snapshot file.
//!
//! Layout, pretty-printed JSON:
//!
//! ```json
//! {
//!   "players": [ { "name": "Alice", "status": "disconnected", ... } ],
//!   "timestamp": "2024-05-01T12:00:00Z"
//! }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use playwatch_ledger::PlayerRecord;
use playwatch_protocol::{Codec, JsonCodec};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// The durable unit: every player record plus when it was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(players: Vec<PlayerRecord>, timestamp: DateTime<Utc>) -> Self {
        Self { players, timestamp }
    }
}

/// Reads and writes the snapshot file at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    codec: JsonCodec,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: JsonCodec,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `snapshot`, replacing any previous file.
    ///
    /// The bytes go to a sibling temp file first and are then renamed
    /// over the target, so a crash mid-write never leaves a half-written
    /// snapshot behind. Missing parent directories are created.
    ///
    /// # Errors
    /// [`StoreError::Format`] if encoding fails, [`StoreError::Io`] for
    /// any filesystem failure.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let bytes = self.codec.encode(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            players = snapshot.players.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Reads the snapshot file as-is.
    ///
    /// Returns `Ok(None)` if there is no file yet.
    ///
    /// # Errors
    /// [`StoreError::Io`] if the file exists but cannot be read,
    /// [`StoreError::Format`] if it is not a valid snapshot.
    pub async fn read(&self) -> Result<Option<Snapshot>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&self.path, e)),
        };
        let snapshot = self.codec.decode(&bytes)?;
        Ok(Some(snapshot))
    }

    /// Loads the persisted players for startup.
    ///
    /// Every record comes back offline with a zeroed live duration. A
    /// missing, unreadable, or corrupt file is logged and treated as "no
    /// prior data".
    pub async fn load(&self) -> Vec<PlayerRecord> {
        let snapshot = match self.read().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "no snapshot found, starting empty");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to load snapshot, starting empty"
                );
                return Vec::new();
            }
        };

        let mut players = snapshot.players;
        for record in &mut players {
            record.mark_offline();
        }

        tracing::info!(
            path = %self.path.display(),
            players = players.len(),
            saved_at = %snapshot.timestamp,
            "snapshot loaded"
        );
        players
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

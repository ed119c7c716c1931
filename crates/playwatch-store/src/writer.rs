//! Snapshot writer actor: a Tokio task that owns the snapshot file.
//!
//! The tracker hands each post-mutation snapshot to this task through an
//! unbounded channel and returns immediately. The task writes them one at
//! a time, in the order they were queued, and logs failures instead of
//! reporting them back.

use tokio::sync::{mpsc, oneshot};

use crate::{Snapshot, SnapshotStore, StoreError};

/// Commands sent to the writer task.
enum WriterCommand {
    /// Write this snapshot.
    Save(Snapshot),

    /// Reply once every previously queued save has been attempted.
    Flush { reply: oneshot::Sender<()> },
}

/// Handle to a running writer task.
///
/// Cheap to clone. The task exits once every handle is dropped and the
/// queue has drained.
#[derive(Clone)]
pub struct SnapshotHandle {
    sender: mpsc::UnboundedSender<WriterCommand>,
}

impl SnapshotHandle {
    /// Queues a snapshot for writing (fire-and-forget).
    ///
    /// # Errors
    /// [`StoreError::WriterClosed`] if the writer task is gone.
    pub fn persist(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        self.sender
            .send(WriterCommand::Save(snapshot))
            .map_err(|_| StoreError::WriterClosed)
    }

    /// Waits until every snapshot queued before this call has been
    /// written (or has failed and been logged).
    ///
    /// # Errors
    /// [`StoreError::WriterClosed`] if the writer task is gone.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(WriterCommand::Flush { reply: reply_tx })
            .map_err(|_| StoreError::WriterClosed)?;
        reply_rx.await.map_err(|_| StoreError::WriterClosed)
    }
}

/// The internal writer state. Runs inside a Tokio task.
struct SnapshotWriter {
    store: SnapshotStore,
    receiver: mpsc::UnboundedReceiver<WriterCommand>,
    failures: u64,
}

impl SnapshotWriter {
    async fn run(mut self) {
        tracing::debug!(path = %self.store.path().display(), "snapshot writer started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                WriterCommand::Save(snapshot) => self.save(&snapshot).await,
                WriterCommand::Flush { reply } => {
                    let _ = reply.send(());
                }
            }
        }

        tracing::debug!(failures = self.failures, "snapshot writer stopped");
    }

    async fn save(&mut self, snapshot: &Snapshot) {
        if let Err(e) = self.store.save(snapshot).await {
            self.failures += 1;
            tracing::error!(
                error = %e,
                failures = self.failures,
                "failed to save snapshot"
            );
        }
    }
}

/// Spawns the writer task for `store` and returns a handle to it.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_writer(store: SnapshotStore) -> SnapshotHandle {
    let (tx, rx) = mpsc::unbounded_channel();

    let writer = SnapshotWriter {
        store,
        receiver: rx,
        failures: 0,
    };
    tokio::spawn(writer.run());

    SnapshotHandle { sender: tx }
}

//! `PlaywatchServer` builder and server loop.
//!
//! Ties the layers together: snapshot store → ledger → presence cache →
//! tracker, with the HTTP API and the optional feed subscriber in front.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use playwatch_ledger::SessionLedger;
use playwatch_store::{spawn_writer, SnapshotStore, StoreError};
use tokio::net::TcpListener;

use crate::config::{EventSourceKind, PlaywatchConfig};
use crate::feed::spawn_feed;
use crate::handlers::AppState;
use crate::router::build_router;
use crate::source::SourceStatus;
use crate::tracker::Tracker;
use crate::PlaywatchError;

/// Builder for configuring and starting a Playwatch server.
///
/// # Example
///
/// ```rust,ignore
/// let server = PlaywatchServer::builder()
///     .config(PlaywatchConfig::load()?.0)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct PlaywatchServerBuilder {
    config: PlaywatchConfig,
}

impl PlaywatchServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: PlaywatchConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: PlaywatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the HTTP API to.
    pub fn bind(mut self, host: &str, port: u16) -> Self {
        self.config.host = host.to_string();
        self.config.port = port;
        self
    }

    /// Restores persisted players, starts the snapshot writer, and binds
    /// the listener.
    ///
    /// # Errors
    /// [`PlaywatchError::Store`] if the data directory cannot be created,
    /// [`PlaywatchError::Bind`] if the address is unavailable.
    pub async fn build(self) -> Result<PlaywatchServer, PlaywatchError> {
        let config = self.config;

        if let Some(parent) = config.data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let store = SnapshotStore::new(&config.data_file);
        let players = store.load().await;
        let ledger = SessionLedger::restore(players);
        let snapshots = spawn_writer(store);

        let tracker = Arc::new(Tracker::new(
            ledger,
            config.presence(),
            config.event_log_capacity,
            Some(snapshots),
        ));

        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| PlaywatchError::Bind { addr, source })?;

        Ok(PlaywatchServer {
            listener,
            tracker,
            source: SourceStatus::new(config.event_source),
            config,
        })
    }
}

impl Default for PlaywatchServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Playwatch server.
///
/// Call [`run()`](Self::run) to start serving.
pub struct PlaywatchServer {
    listener: TcpListener,
    tracker: Arc<Tracker>,
    source: SourceStatus,
    config: PlaywatchConfig,
}

impl PlaywatchServer {
    /// Creates a new builder.
    pub fn builder() -> PlaywatchServerBuilder {
        PlaywatchServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    pub fn source_status(&self) -> &SourceStatus {
        &self.source
    }

    /// Serves until Ctrl-C.
    ///
    /// # Errors
    /// See [`run_until`](Self::run_until).
    pub async fn run(self) -> Result<(), PlaywatchError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serves until `shutdown` completes, then stops the feed subscriber
    /// and waits for pending snapshot writes.
    ///
    /// # Errors
    /// [`PlaywatchError::Serve`] if the HTTP server fails,
    /// [`PlaywatchError::Store`] if the snapshot writer is gone at
    /// shutdown.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), PlaywatchError> {
        let feed = match (self.config.event_source, &self.config.feed.url) {
            (EventSourceKind::Feed, Some(url)) => Some(spawn_feed(
                url.clone(),
                self.config.feed.clone(),
                Arc::clone(&self.tracker),
                self.source.clone(),
            )),
            _ => None,
        };

        let state = Arc::new(AppState {
            tracker: Arc::clone(&self.tracker),
            source: self.source.clone(),
            ui: self.config.ui.clone(),
        });
        let router = build_router(state);

        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(
                %addr,
                event_source = %self.config.event_source,
                data_file = %self.config.data_file.display(),
                "playwatch server running"
            );
        }

        let served = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(PlaywatchError::Serve);

        if let Some(feed) = feed {
            feed.shutdown().await;
        }
        self.tracker.flush().await?;
        tracing::info!("playwatch server stopped");

        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

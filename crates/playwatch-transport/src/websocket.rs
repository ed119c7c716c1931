//! WebSocket feed implementation using `tokio-tungstenite`.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;

use crate::{FeedId, TransportError};

/// Counter for generating unique feed IDs.
static NEXT_FEED_ID: AtomicU64 = AtomicU64::new(1);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A client-side WebSocket subscription delivering one event per frame.
pub struct WebSocketFeed {
    id: FeedId,
    url: String,
    ws: WsStream,
}

impl WebSocketFeed {
    /// Connects to the feed at `url` (`ws://` or `wss://`).
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectFailed {
                url: url.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e),
            })?;

        let id = FeedId::new(NEXT_FEED_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, url, "connected to WebSocket feed");

        Ok(Self {
            id,
            url: url.to_string(),
            ws,
        })
    }

    /// Receives the next data frame.
    ///
    /// Text and binary frames are both returned as bytes. Returns
    /// `Ok(None)` when the remote side closes the feed.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    /// Closes the feed.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.ws.close(None).await.map_err(|e| {
            TransportError::CloseFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })?;
        // Drain until the close handshake completes.
        while let Some(Ok(_)) = self.ws.next().await {}
        Ok(())
    }

    pub fn id(&self) -> FeedId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

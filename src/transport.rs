//! Transport seam — duplex text-frame connection to the RPC endpoint.
//!
//! DESIGN
//! ======
//! The session never touches a socket directly. It asks a [`Connector`] for
//! a [`Connection`] and then pulls inbound frames one at a time, so each pull
//! is a suspension point and frames arrive in transport order. The WebSocket
//! implementation sits on `tokio-tungstenite`; tests swap in an in-memory one.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

// =============================================================================
// TYPES
// =============================================================================

/// Errors raised by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection or handshake could not be established.
    #[error("websocket connect failed: {0}")]
    Connect(Box<tungstenite::Error>),
    /// Reading the next frame failed.
    #[error("websocket receive failed: {0}")]
    Receive(Box<tungstenite::Error>),
    /// The outgoing frame was rejected.
    #[error("websocket send failed: {0}")]
    Send(Box<tungstenite::Error>),
    /// The shutdown handshake failed.
    #[error("websocket close failed: {0}")]
    Close(Box<tungstenite::Error>),
}

/// One inbound frame as seen by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete text frame.
    Text(String),
    /// The remote side closed the connection gracefully.
    Close,
}

/// Opens connections to an endpoint URL.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Establish a duplex connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] on refusal, resolution or handshake failure.
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, TransportError>;
}

/// A live duplex connection, exclusively owned by one session.
#[async_trait::async_trait]
pub trait Connection: Send {
    /// Wait for the next inbound frame. `None` means the stream is exhausted.
    async fn next_frame(&mut self) -> Option<Result<Inbound, TransportError>>;

    /// Send one text frame. Completes once the transport accepts it.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Request graceful shutdown.
    async fn close(&mut self) -> Result<(), TransportError>;
}

// =============================================================================
// WEBSOCKET
// =============================================================================

/// [`Connector`] over `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait::async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, TransportError> {
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(Box::new(e)))?;
        Ok(Box::new(WsConnection { stream }))
    }
}

/// A WebSocket connection. Binary, ping and pong frames are skipped.
pub struct WsConnection {
    stream: WsStream,
}

#[async_trait::async_trait]
impl Connection for WsConnection {
    async fn next_frame(&mut self) -> Option<Result<Inbound, TransportError>> {
        loop {
            let msg = match self.stream.next().await? {
                Ok(msg) => msg,
                Err(tungstenite::Error::ConnectionClosed) => return Some(Ok(Inbound::Close)),
                Err(e) => return Some(Err(TransportError::Receive(Box::new(e)))),
            };
            match msg {
                Message::Text(text) => return Some(Ok(Inbound::Text(text.as_str().to_owned()))),
                Message::Close(_) => return Some(Ok(Inbound::Close)),
                _ => {}
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(Box::new(e)))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.stream.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(TransportError::Close(Box::new(e))),
        }
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;

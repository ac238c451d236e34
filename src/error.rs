use crate::transport::TransportError;

/// Errors returned by [`crate::session::Session`] operations.
///
/// None of these are fatal: after any of them the session either still holds
/// its connection or holds none, and `close` is always safe to call.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The transport could not be established or failed while listening.
    #[error("connection failed: {0}")]
    Connection(#[from] TransportError),

    /// The connect deadline elapsed before the handshake finished.
    #[error("timed out connecting to {url}")]
    ConnectTimeout { url: String },

    /// An operation that needs a live connection was called without one.
    #[error("not connected; call connect() before {operation}")]
    NotConnected { operation: &'static str },

    /// An outbound envelope could not be encoded.
    #[error("envelope encode failed: {0}")]
    Encode(#[from] envelope::CodecError),

    /// The transport rejected an outbound frame. Not retried.
    #[error("failed to send {payload}: {source}")]
    Send {
        payload: String,
        source: TransportError,
    },

    /// The stream ended before the READY event arrived.
    #[error("connection closed before READY")]
    ClosedBeforeReady,

    /// READY did not arrive within the deadline.
    #[error("timed out waiting for READY")]
    ReadyTimeout,
}

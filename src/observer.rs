//! Observer — injected sink for everything a session reports.
//!
//! The session never logs directly. Each lifecycle step, classified message
//! and failure goes to a [`SessionObserver`]; [`TracingObserver`] turns them
//! into `tracing` events, tests plug in a recorder.

use envelope::{CodecError, Envelope};
use tracing::{error, info};

use crate::dispatch::Message;
use crate::error::SessionError;
use crate::transport::TransportError;

/// Receives session events. All methods default to no-ops.
///
/// Callbacks run inline on the receive loop: the next frame is not awaited
/// until the callback returns.
#[allow(unused_variables)]
pub trait SessionObserver: Send + Sync {
    fn connecting(&self, url: &str) {}

    fn connected(&self, url: &str) {}

    fn connect_failed(&self, url: &str, error: &SessionError) {}

    /// Raw inbound text, before decoding.
    fn frame_received(&self, raw: &str) {}

    /// A frame failed to decode and was skipped.
    fn decode_error(&self, raw: &str, error: &CodecError) {}

    /// A decoded frame, classified.
    fn message(&self, message: &Message<'_>) {}

    /// An inbound envelope answered a pending nonce sent with `cmd`.
    fn response(&self, nonce: &str, cmd: &str, envelope: &Envelope) {}

    fn sent(&self, payload: &str) {}

    fn send_failed(&self, payload: &str, error: &TransportError) {}

    /// `operation` was called without a connection.
    fn usage_error(&self, operation: &'static str) {}

    /// The transport failed mid-stream or during shutdown.
    fn transport_error(&self, error: &TransportError) {}

    fn remote_closed(&self) {}

    fn closed(&self) {}
}

/// Default observer: structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn connecting(&self, url: &str) {
        info!(%url, "rpc: connecting");
    }

    fn connected(&self, url: &str) {
        info!(%url, "rpc: connected");
    }

    fn connect_failed(&self, url: &str, error: &SessionError) {
        error!(%url, %error, "rpc: failed to connect");
    }

    fn frame_received(&self, raw: &str) {
        info!(%raw, "rpc: recv frame");
    }

    fn decode_error(&self, raw: &str, error: &CodecError) {
        error!(%error, %raw, "rpc: failed to parse frame");
    }

    fn message(&self, message: &Message<'_>) {
        match message {
            Message::Ready(ready) => {
                let username = ready.username().unwrap_or("<unknown>");
                let config = ready.config.map(ToString::to_string).unwrap_or_default();
                info!(%username, %config, "rpc: ready");
            }
            Message::Dispatch { evt, data } => {
                let evt = evt.unwrap_or("<none>");
                let data = data.map(ToString::to_string).unwrap_or_default();
                info!(%evt, %data, "rpc: dispatch event");
            }
            Message::Unknown { cmd, evt } => {
                info!(cmd = ?cmd, evt = ?evt, "rpc: unknown message type");
            }
        }
    }

    fn response(&self, nonce: &str, cmd: &str, _envelope: &Envelope) {
        info!(%nonce, %cmd, "rpc: response");
    }

    fn sent(&self, payload: &str) {
        info!(%payload, "rpc: sent");
    }

    fn send_failed(&self, payload: &str, error: &TransportError) {
        error!(%error, %payload, "rpc: failed to send command");
    }

    fn usage_error(&self, operation: &'static str) {
        error!(%operation, "rpc: not connected; call connect() first");
    }

    fn transport_error(&self, error: &TransportError) {
        error!(%error, "rpc: transport error");
    }

    fn remote_closed(&self) {
        info!("rpc: connection closed by server");
    }

    fn closed(&self) {
        info!("rpc: connection closed");
    }
}

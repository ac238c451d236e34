//! Client for the local WebSocket RPC service on `localhost:6463`.
//!
//! ARCHITECTURE
//! ============
//! `envelope` (wire model) ← `transport` (duplex text frames) ← `session`
//! (lifecycle, receive loop, dispatch, send). `dispatch` classifies inbound
//! envelopes and `observer` is the sink the session reports through.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod observer;
pub mod session;
pub mod transport;

pub use config::SessionConfig;
pub use dispatch::{Message, Ready, classify};
pub use envelope::Envelope;
pub use error::SessionError;
pub use observer::{SessionObserver, TracingObserver};
pub use session::{ListenEnd, Session};

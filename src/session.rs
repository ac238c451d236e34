//! RPC session — connection lifecycle, receive loop and command send path.
//!
//! LIFECYCLE
//! =========
//! 1. `connect` → connector opens the endpoint, the handle is stored
//! 2. `listen` pulls frames in order → decode → correlate nonce → classify → observer
//! 3. `send` and its helpers encode an envelope and hand it to the transport
//! 4. `close` shuts the transport down and drops the handle
//!
//! Every operation takes `&mut self`, so one session has a single reader and
//! at most one in-flight operation. Failures are returned and reported to the
//! observer; none of them leave a half-built handle behind.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use envelope::{EVT_READY, Envelope};
use serde_json::Value;

use crate::config::SessionConfig;
use crate::dispatch::classify;
use crate::error::SessionError;
use crate::observer::{SessionObserver, TracingObserver};
use crate::transport::{Connection, Connector, Inbound, WsConnector};

// =============================================================================
// TYPES
// =============================================================================

/// Why a receive loop ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenEnd {
    /// The remote side sent a close frame.
    RemoteClosed,
    /// The frame stream ended without a close frame.
    Exhausted,
    /// The caller's deadline elapsed (`listen_for` only).
    DeadlineElapsed,
}

/// Most unanswered nonces kept for correlation. The oldest is forgotten first.
pub const MAX_PENDING_REQUESTS: usize = 256;

/// How a pump over the frame stream stopped.
enum Pumped {
    Matched(Envelope),
    Ended(ListenEnd),
}

/// One client session against the local RPC endpoint.
pub struct Session {
    config: SessionConfig,
    connector: Box<dyn Connector>,
    observer: Arc<dyn SessionObserver>,
    connection: Option<Box<dyn Connection>>,
    /// Outstanding nonces and the command each was sent with.
    pending: HashMap<String, String>,
    /// Pending nonces, oldest first.
    pending_order: VecDeque<String>,
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl Session {
    /// Session over WebSocket, logging through `tracing`.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            connector: Box::new(WsConnector),
            observer: Arc::new(TracingObserver),
            connection: None,
            pending: HashMap::new(),
            pending_order: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn with_connector(mut self, connector: Box<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Number of sent nonces not yet answered, at most [`MAX_PENDING_REQUESTS`].
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

impl Session {
    /// Open the transport to the configured endpoint.
    ///
    /// A handle that is already present is closed first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Connection`] when the transport refuses and
    /// [`SessionError::ConnectTimeout`] when the connect deadline elapses.
    /// No handle is stored in either case.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.connection.is_some() {
            self.close().await;
        }

        let url = self.config.url();
        self.observer.connecting(&url);

        let attempt = tokio::time::timeout(self.config.connect_timeout(), self.connector.connect(&url)).await;
        let error = match attempt {
            Ok(Ok(connection)) => {
                self.connection = Some(connection);
                self.observer.connected(&url);
                return Ok(());
            }
            Ok(Err(e)) => SessionError::Connection(e),
            Err(_) => SessionError::ConnectTimeout { url: url.clone() },
        };

        self.observer.connect_failed(&url, &error);
        Err(error)
    }

    /// Shut the transport down and drop the handle. A no-op without a handle.
    ///
    /// Shutdown errors are reported to the observer; the handle is dropped
    /// regardless.
    pub async fn close(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        self.pending.clear();
        self.pending_order.clear();

        if let Err(e) = connection.close().await {
            self.observer.transport_error(&e);
        }
        self.observer.closed();
    }
}

// =============================================================================
// RECEIVE
// =============================================================================

impl Session {
    /// Receive and dispatch frames until the stream ends.
    ///
    /// Malformed frames are reported and skipped. Each frame is fully
    /// dispatched before the next one is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] without touching the transport
    /// when there is no handle, and [`SessionError::Connection`] when the
    /// transport fails mid-stream. The handle is kept in both cases.
    pub async fn listen(&mut self) -> Result<ListenEnd, SessionError> {
        match self.pump("listen", |_| false).await? {
            Pumped::Ended(end) => Ok(end),
            // The predicate never matches.
            Pumped::Matched(_) => Ok(ListenEnd::Exhausted),
        }
    }

    /// [`Session::listen`] bounded by `deadline`.
    ///
    /// When the deadline elapses the in-progress receive is dropped, the
    /// handle stays in place and `close` remains safe.
    ///
    /// # Errors
    ///
    /// Same as [`Session::listen`].
    pub async fn listen_for(&mut self, deadline: Duration) -> Result<ListenEnd, SessionError> {
        if self.connection.is_none() {
            return Err(self.not_connected("listen_for"));
        }
        match tokio::time::timeout(deadline, self.listen()).await {
            Ok(result) => result,
            Err(_) => Ok(ListenEnd::DeadlineElapsed),
        }
    }

    /// Receive frames until the READY event and return it.
    ///
    /// Frames before READY are dispatched as usual.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`], [`SessionError::Connection`],
    /// [`SessionError::ClosedBeforeReady`] when the stream ends first, or
    /// [`SessionError::ReadyTimeout`] after `deadline`.
    pub async fn wait_for_ready(&mut self, deadline: Duration) -> Result<Envelope, SessionError> {
        if self.connection.is_none() {
            return Err(self.not_connected("wait_for_ready"));
        }
        let pumped = tokio::time::timeout(deadline, self.pump("wait_for_ready", |env| env.evt() == Some(EVT_READY)))
            .await
            .map_err(|_| SessionError::ReadyTimeout)??;
        match pumped {
            Pumped::Matched(ready) => Ok(ready),
            Pumped::Ended(_) => Err(SessionError::ClosedBeforeReady),
        }
    }

    /// Pull frames in order, dispatching each, until `stop` matches a decoded
    /// envelope or the stream ends.
    async fn pump(
        &mut self,
        operation: &'static str,
        stop: impl Fn(&Envelope) -> bool,
    ) -> Result<Pumped, SessionError> {
        loop {
            let Some(connection) = self.connection.as_mut() else {
                return Err(not_connected(self.observer.as_ref(), operation));
            };

            let inbound = match connection.next_frame().await {
                None => return Ok(Pumped::Ended(ListenEnd::Exhausted)),
                Some(Ok(inbound)) => inbound,
                Some(Err(e)) => {
                    self.observer.transport_error(&e);
                    return Err(SessionError::Connection(e));
                }
            };

            match inbound {
                Inbound::Close => {
                    self.observer.remote_closed();
                    return Ok(Pumped::Ended(ListenEnd::RemoteClosed));
                }
                Inbound::Text(text) => {
                    if let Some(env) = self.handle_text(&text) {
                        if stop(&env) {
                            return Ok(Pumped::Matched(env));
                        }
                    }
                }
            }
        }
    }

    /// Decode one frame and route it. Returns the envelope when it decoded.
    fn handle_text(&mut self, text: &str) -> Option<Envelope> {
        self.observer.frame_received(text);

        let env = match envelope::decode_envelope(text) {
            Ok(env) => env,
            Err(e) => {
                self.observer.decode_error(text, &e);
                return None;
            }
        };

        if let Some(nonce) = env.nonce.as_deref() {
            if let Some(cmd) = self.pending.remove(nonce) {
                self.pending_order.retain(|pending| pending != nonce);
                self.observer.response(nonce, &cmd, &env);
            }
        }

        self.observer.message(&classify(&env));
        Some(env)
    }
}

// =============================================================================
// SEND
// =============================================================================

impl Session {
    /// Encode and transmit one envelope. At most once; never retried.
    ///
    /// An envelope carrying a nonce is remembered until a response echoes it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] without touching the transport
    /// when there is no handle, [`SessionError::Encode`] for unencodable
    /// payloads, and [`SessionError::Send`] with the payload when the
    /// transport rejects the frame.
    pub async fn send(&mut self, envelope: &Envelope) -> Result<(), SessionError> {
        let Some(connection) = self.connection.as_mut() else {
            return Err(not_connected(self.observer.as_ref(), "send"));
        };

        let payload = envelope::encode_envelope(envelope)?;
        if let Err(e) = connection.send_text(payload.clone()).await {
            self.observer.send_failed(&payload, &e);
            return Err(SessionError::Send { payload, source: e });
        }

        if let Some(nonce) = &envelope.nonce {
            self.track_pending(nonce, envelope.cmd.clone().unwrap_or_default());
        }
        self.observer.sent(&payload);
        Ok(())
    }

    fn track_pending(&mut self, nonce: &str, cmd: String) {
        if self.pending.insert(nonce.to_owned(), cmd).is_none() {
            self.pending_order.push_back(nonce.to_owned());
        }
        while self.pending_order.len() > MAX_PENDING_REQUESTS {
            if let Some(oldest) = self.pending_order.pop_front() {
                self.pending.remove(&oldest);
            }
        }
    }

    /// Push a rich-presence update for this process. `activity` is sent verbatim.
    ///
    /// # Errors
    ///
    /// Same as [`Session::send`].
    pub async fn send_activity_update(&mut self, activity: Value) -> Result<(), SessionError> {
        let envelope = Envelope::set_activity(std::process::id(), activity);
        self.send(&envelope).await
    }

    /// Send `envelope` under a fresh nonce and return that nonce.
    ///
    /// # Errors
    ///
    /// Same as [`Session::send`].
    pub async fn request(&mut self, envelope: Envelope) -> Result<String, SessionError> {
        let nonce = uuid::Uuid::new_v4().to_string();
        self.send(&envelope.with_nonce(nonce.clone())).await?;
        Ok(nonce)
    }

    /// # Errors
    ///
    /// Same as [`Session::send`].
    pub async fn get_guilds(&mut self) -> Result<String, SessionError> {
        self.request(Envelope::get_guilds()).await
    }

    /// # Errors
    ///
    /// Same as [`Session::send`].
    pub async fn get_channels(&mut self, guild_id: Option<&str>) -> Result<String, SessionError> {
        self.request(Envelope::get_channels(guild_id)).await
    }

    fn not_connected(&self, operation: &'static str) -> SessionError {
        not_connected(self.observer.as_ref(), operation)
    }
}

fn not_connected(observer: &dyn SessionObserver, operation: &'static str) -> SessionError {
    observer.usage_error(operation);
    SessionError::NotConnected { operation }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

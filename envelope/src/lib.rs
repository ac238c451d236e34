//! Shared envelope model and JSON text codec for the local RPC wire.
//!
//! Every message in either direction is one JSON object carrying some of
//! `cmd`, `evt`, `data`, `args` and `nonce`. Payloads (`data`, `args`) stay
//! as `serde_json::Value` so unknown command and event shapes pass through
//! untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// NAMES
// =============================================================================

/// Command marker on server-pushed events.
pub const CMD_DISPATCH: &str = "DISPATCH";

/// Rich-presence update.
pub const CMD_SET_ACTIVITY: &str = "SET_ACTIVITY";

pub const CMD_GET_GUILDS: &str = "GET_GUILDS";

pub const CMD_GET_CHANNELS: &str = "GET_CHANNELS";

/// Event name of the handshake-complete signal.
pub const EVT_READY: &str = "READY";

/// Fixed nonce used by activity updates.
pub const ACTIVITY_NONCE: &str = "activity-update";

// =============================================================================
// ERROR
// =============================================================================

/// Error returned by [`decode_envelope`] and [`encode_envelope`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON, or a known field has the wrong type.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The text is valid JSON but not an object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// A single message on the RPC wire. Absent fields are omitted on encode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Command name, e.g. `"SET_ACTIVITY"` or `"DISPATCH"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    /// Event name, e.g. `"READY"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evt: Option<String>,
    /// Event or response payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Command arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    /// Caller-chosen correlation token, echoed back on the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl Envelope {
    /// Create an outbound command envelope.
    #[must_use]
    pub fn command(cmd: impl Into<String>) -> Self {
        Self {
            cmd: Some(cmd.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    #[must_use]
    pub fn with_evt(mut self, evt: impl Into<String>) -> Self {
        self.evt = Some(evt.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// `SET_ACTIVITY` with `args = {pid, activity}` and the fixed activity nonce.
    /// The activity payload is passed through verbatim.
    #[must_use]
    pub fn set_activity(pid: u32, activity: Value) -> Self {
        Self::command(CMD_SET_ACTIVITY)
            .with_args(serde_json::json!({ "pid": pid, "activity": activity }))
            .with_nonce(ACTIVITY_NONCE)
    }

    #[must_use]
    pub fn get_guilds() -> Self {
        Self::command(CMD_GET_GUILDS)
    }

    /// `GET_CHANNELS` for a guild; a missing id is sent as `null`.
    #[must_use]
    pub fn get_channels(guild_id: Option<&str>) -> Self {
        Self::command(CMD_GET_CHANNELS).with_args(serde_json::json!({ "guild_id": guild_id }))
    }

    #[must_use]
    pub fn cmd(&self) -> Option<&str> {
        self.cmd.as_deref()
    }

    #[must_use]
    pub fn evt(&self) -> Option<&str> {
        self.evt.as_deref()
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode an envelope into its wire text.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if a payload cannot be serialized.
pub fn encode_envelope(envelope: &Envelope) -> Result<String, CodecError> {
    Ok(serde_json::to_string(envelope)?)
}

/// Decode one text frame into an envelope.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed JSON or mistyped fields and
/// [`CodecError::NotAnObject`] when the top-level value is not an object.
pub fn decode_envelope(text: &str) -> Result<Envelope, CodecError> {
    let value = serde_json::from_str::<Value>(text)?;
    if !value.is_object() {
        return Err(CodecError::NotAnObject(json_kind(&value)));
    }
    Ok(serde_json::from_value(value)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;

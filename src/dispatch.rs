//! Message classification for inbound envelopes.
//!
//! Pure and stateless: `classify` only locates fields, it never validates
//! payload shapes. Priority is READY, then DISPATCH, then unknown.

use envelope::{CMD_DISPATCH, EVT_READY, Envelope};
use serde_json::Value;

/// Classified view of an inbound envelope, borrowing from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message<'a> {
    /// Handshake complete; commands may be issued from here on.
    Ready(Ready<'a>),
    /// Server-pushed event named by `evt`.
    Dispatch {
        evt: Option<&'a str>,
        data: Option<&'a Value>,
    },
    /// Neither READY nor DISPATCH. Informational only.
    Unknown {
        cmd: Option<&'a str>,
        evt: Option<&'a str>,
    },
}

/// Identity and configuration carried by the READY event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ready<'a> {
    pub user: Option<&'a Value>,
    pub config: Option<&'a Value>,
}

impl<'a> Ready<'a> {
    /// `user.username`, when present and a string.
    #[must_use]
    pub fn username(&self) -> Option<&'a str> {
        self.user?.get("username")?.as_str()
    }
}

/// Classify an envelope. `evt == READY` wins over any `cmd`.
#[must_use]
pub fn classify(envelope: &Envelope) -> Message<'_> {
    if envelope.evt() == Some(EVT_READY) {
        let data = envelope.data.as_ref();
        return Message::Ready(Ready {
            user: data.and_then(|d| d.get("user")),
            config: data.and_then(|d| d.get("config")),
        });
    }

    if envelope.cmd() == Some(CMD_DISPATCH) {
        return Message::Dispatch {
            evt: envelope.evt(),
            data: envelope.data.as_ref(),
        };
    }

    Message::Unknown {
        cmd: envelope.cmd(),
        evt: envelope.evt(),
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;

//! Session configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6463;
pub const DEFAULT_PROTOCOL_VERSION: u32 = 1;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_LISTEN_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    pub connect_secs: u64,
    pub ready_secs: u64,
    pub listen_secs: u64,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            ready_secs: DEFAULT_READY_TIMEOUT_SECS,
            listen_secs: DEFAULT_LISTEN_SECS,
        }
    }
}

/// Endpoint and deadlines for one session. The endpoint is fixed once a
/// session is built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    /// Application id appended to the endpoint query when present.
    pub client_id: Option<String>,
    pub version: u32,
    pub timeouts: SessionTimeouts,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            client_id: None,
            version: DEFAULT_PROTOCOL_VERSION,
            timeouts: SessionTimeouts::default(),
        }
    }
}

impl SessionConfig {
    /// Build typed session config from environment variables.
    ///
    /// Optional:
    /// - `RPC_HOST`: default `localhost`
    /// - `RPC_PORT`: default 6463
    /// - `RPC_CLIENT_ID`: unset by default
    /// - `RPC_VERSION`: default 1
    /// - `RPC_CONNECT_TIMEOUT_SECS`: default 10
    /// - `RPC_READY_TIMEOUT_SECS`: default 5
    /// - `RPC_LISTEN_SECS`: default 10
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`], reading values through `lookup`.
    /// Empty values count as unset and unparseable numbers fall back to the default.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = get("RPC_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = parse_or(get("RPC_PORT"), DEFAULT_PORT);
        let client_id = get("RPC_CLIENT_ID");
        let version = parse_or(get("RPC_VERSION"), DEFAULT_PROTOCOL_VERSION);
        let timeouts = SessionTimeouts {
            connect_secs: parse_or(get("RPC_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
            ready_secs: parse_or(get("RPC_READY_TIMEOUT_SECS"), DEFAULT_READY_TIMEOUT_SECS),
            listen_secs: parse_or(get("RPC_LISTEN_SECS"), DEFAULT_LISTEN_SECS),
        };

        Self { host, port, client_id, version, timeouts }
    }

    /// WebSocket URL of the endpoint, e.g. `ws://localhost:6463/`.
    /// The client id is percent-encoded into the query.
    #[must_use]
    pub fn url(&self) -> String {
        let base = format!("ws://{}:{}/", self.host, self.port);
        match &self.client_id {
            Some(client_id) => format!(
                "{base}?v={}&client_id={}&encoding=json",
                self.version,
                urlencoding::encode(client_id)
            ),
            None => base,
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.connect_secs)
    }

    #[must_use]
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.ready_secs)
    }

    #[must_use]
    pub fn listen_duration(&self) -> Duration {
        Duration::from_secs(self.timeouts.listen_secs)
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

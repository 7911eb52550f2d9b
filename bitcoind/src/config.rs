//! Connection configuration for the bitcoind JSON-RPC interface.
//!
//! This module aggregates everything the RPC adapter needs to reach a
//! node:
//!
//! - the daemon address (`host:port`),
//! - whether TLS is used on the connection,
//! - the transport mode (one-shot HTTP POST vs. a persistent connection),
//! - the authentication mode (user/password, cookie file, or none).
//!
//! A [`RpcConfig`] is built once at startup by the binary and is read-only
//! afterwards.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default address of a mainnet bitcoind RPC server.
pub const DEFAULT_RPC_ADDR: &str = "127.0.0.1:8332";

/// Errors raised while assembling a [`RpcConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A cookie file and a user/password were both supplied.
    #[error("rpc cookie file and rpc user/password are mutually exclusive")]
    ConflictingAuth,
    /// The RPC address is not a `host:port` pair.
    #[error("invalid rpc address {0:?}: expected host:port")]
    InvalidAddr(String),
}

/// Authentication mode used for every RPC call.
#[derive(Clone, PartialEq, Eq)]
pub enum RpcAuth {
    /// No `Authorization` header is sent.
    None,
    /// HTTP basic auth with static credentials (`rpcuser`/`rpcpassword`).
    UserPass { user: String, pass: String },
    /// HTTP basic auth with credentials read from the daemon's `.cookie`
    /// file on every call.
    Cookie(PathBuf),
}

impl RpcAuth {
    /// Selects the auth mode from the independently settable user, password
    /// and cookie options.
    ///
    /// A cookie path selects [`RpcAuth::Cookie`], a user or password selects
    /// [`RpcAuth::UserPass`]; supplying both kinds is an error.
    pub fn from_parts(
        user: Option<String>,
        pass: Option<String>,
        cookie: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let has_user_pass = user.is_some() || pass.is_some();
        match (cookie, has_user_pass) {
            (Some(_), true) => Err(ConfigError::ConflictingAuth),
            (Some(path), false) => Ok(Self::Cookie(path)),
            (None, true) => Ok(Self::UserPass {
                user: user.unwrap_or_default(),
                pass: pass.unwrap_or_default(),
            }),
            (None, false) => Ok(Self::None),
        }
    }

    /// Short name of the mode, used in logs.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::UserPass { .. } => "user-pass",
            Self::Cookie(_) => "cookie",
        }
    }
}

// Credentials never end up in logs.
impl fmt::Debug for RpcAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::UserPass { user, .. } => f
                .debug_struct("UserPass")
                .field("user", user)
                .field("pass", &"<redacted>")
                .finish(),
            Self::Cookie(path) => f.debug_tuple("Cookie").field(path).finish(),
        }
    }
}

/// Configuration for the bitcoind RPC client.
#[derive(Clone, Debug)]
pub struct RpcConfig {
    /// Daemon address as `host:port`.
    pub addr: String,
    /// Whether to connect with `https://`.
    pub tls: bool,
    /// Open a fresh connection for every call instead of keeping one alive.
    pub http_post: bool,
    /// Authentication mode.
    pub auth: RpcAuth,
    /// Optional per-call timeout. `None` leaves calls bounded only by the
    /// transport.
    pub timeout: Option<Duration>,
}

impl RpcConfig {
    /// Creates a configuration for `addr` with TLS on, persistent
    /// connections and no authentication.
    pub fn new(addr: impl Into<String>) -> Result<Self, ConfigError> {
        let addr = addr.into();
        validate_addr(&addr)?;
        Ok(Self {
            addr,
            tls: true,
            http_post: false,
            auth: RpcAuth::None,
            timeout: None,
        })
    }

    /// Base URL every JSON-RPC request is posted to.
    pub fn endpoint(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}/", self.addr)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_RPC_ADDR.to_string(),
            tls: true,
            http_post: false,
            auth: RpcAuth::None,
            timeout: None,
        }
    }
}

fn validate_addr(addr: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidAddr(addr.to_string());
    let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(invalid());
    }
    Ok(())
}

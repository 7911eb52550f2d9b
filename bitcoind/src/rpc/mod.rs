//! bitcoind JSON-RPC adapter.
//!
//! This module defines the [`NodeRpc`] trait that collectors depend on, the
//! generic [`RpcCommand`] used for calls without a typed wrapper, and the
//! blocking HTTP implementation [`client::RpcClient`].
//!
//! The trait has a single required method, [`NodeRpc::send`], which returns
//! the undecoded `result` member of a response. Typed calls are provided on
//! top of it, so alternative implementations (test doubles, proxies) only
//! need to produce JSON.

pub mod client;
pub mod types;

use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use client::RpcClient;
pub use types::{BlockchainInfo, IndexInfo, IndexStatus, MempoolInfo, PeerInfo};

/// Errors returned by RPC calls.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection, TLS or HTTP-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The daemon rejected the credentials.
    #[error("rpc credentials rejected (HTTP {0})")]
    Unauthorized(u16),
    /// Non-success HTTP status without a JSON-RPC error body.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// The daemon answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// The response could not be decoded into the expected structure.
    #[error("failed to decode {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    /// The cookie file could not be read.
    #[error("unable to read rpc cookie {}: {source}", path.display())]
    Cookie {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The cookie file does not hold `user:password`.
    #[error("malformed rpc cookie {}", path.display())]
    MalformedCookie { path: PathBuf },
}

/// A JSON-RPC command: method name plus positional parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RpcCommand {
    pub method: String,
    pub params: Vec<Value>,
}

impl RpcCommand {
    /// Creates a command without parameters.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Vec::new(),
        }
    }

    /// Appends a positional parameter.
    pub fn param(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// Access to a bitcoind node.
///
/// Implementations must tolerate concurrent calls: one handle is shared by
/// every collector and every in-flight scrape.
pub trait NodeRpc: Send + Sync {
    /// Sends a raw command and returns the `result` member of the response.
    fn send(&self, command: &RpcCommand) -> Result<Value, RpcError>;

    /// Liveness check.
    fn ping(&self) -> Result<(), RpcError> {
        self.send(&RpcCommand::new("ping")).map(|_| ())
    }

    fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError> {
        call_typed(self, "getblockchaininfo")
    }

    fn get_mempool_info(&self) -> Result<MempoolInfo, RpcError> {
        call_typed(self, "getmempoolinfo")
    }

    fn get_peer_info(&self) -> Result<Vec<PeerInfo>, RpcError> {
        call_typed(self, "getpeerinfo")
    }
}

impl<T: NodeRpc + ?Sized> NodeRpc for std::sync::Arc<T> {
    fn send(&self, command: &RpcCommand) -> Result<Value, RpcError> {
        (**self).send(command)
    }
}

/// Decodes the `result` member of a `method` response.
pub fn decode<T: DeserializeOwned>(method: &str, result: Value) -> Result<T, RpcError> {
    serde_json::from_value(result).map_err(|source| RpcError::Decode {
        method: method.to_string(),
        source,
    })
}

fn call_typed<T, R>(rpc: &R, method: &str) -> Result<T, RpcError>
where
    T: DeserializeOwned,
    R: NodeRpc + ?Sized,
{
    let result = rpc.send(&RpcCommand::new(method))?;
    decode(method, result)
}

//! Blocking HTTP JSON-RPC client for bitcoind.
//!
//! Requests are JSON-RPC 1.0 envelopes POSTed to the daemon root:
//!
//! ```json
//! {"jsonrpc": "1.0", "id": 42, "method": "getblockchaininfo", "params": []}
//! ```
//!
//! and responses carry either a `result` or an `error` object:
//!
//! ```json
//! {"result": {...}, "error": null, "id": 42}
//! {"result": null, "error": {"code": -32601, "message": "Method not found"}, "id": 42}
//! ```
//!
//! The client uses the blocking `reqwest` client and is `Send + Sync`, so a
//! single handle can be shared by all collectors. Callers running inside a
//! Tokio runtime must invoke it from a blocking context (e.g.
//! `tokio::task::spawn_blocking`).

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{NodeRpc, RpcCommand, RpcError};
use crate::config::{RpcAuth, RpcConfig};

/// JSON-RPC client for a single bitcoind endpoint.
pub struct RpcClient {
    http: Client,
    endpoint: String,
    auth: RpcAuth,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

impl RpcClient {
    /// Builds a client without contacting the daemon.
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let mut builder = Client::builder()
            .user_agent(concat!("bitcoind-exporter/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout);

        if config.http_post {
            // Every call opens its own connection.
            builder = builder.pool_max_idle_per_host(0);
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: config.endpoint(),
            auth: config.auth.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Builds a client and verifies the daemon is reachable and accepts
    /// the configured credentials.
    pub fn connect(config: &RpcConfig) -> Result<Self, RpcError> {
        let client = Self::new(config)?;
        client.ping()?;
        Ok(client)
    }

    /// URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, RpcError> {
        Ok(match &self.auth {
            RpcAuth::None => request,
            RpcAuth::UserPass { user, pass } => request.basic_auth(user, Some(pass)),
            RpcAuth::Cookie(path) => {
                let (user, pass) = read_cookie(path)?;
                request.basic_auth(user, Some(pass))
            }
        })
    }
}

impl NodeRpc for RpcClient {
    fn send(&self, command: &RpcCommand) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method = %command.method, id, "sending rpc command");

        let body = Request {
            jsonrpc: "1.0",
            id,
            method: &command.method,
            params: &command.params,
        };
        let request = self.authorize(self.http.post(&self.endpoint).json(&body))?;
        let response = request.send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RpcError::Unauthorized(status.as_u16()));
        }

        // bitcoind reports RPC errors with HTTP 500/404 and a JSON body, so the
        // body is inspected before the status.
        let bytes = response.bytes()?;
        match serde_json::from_slice::<Response>(&bytes) {
            Ok(Response {
                error: Some(error), ..
            }) => Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            }),
            Ok(response) if status.is_success() => Ok(response.result),
            Ok(_) => Err(RpcError::Status(status.as_u16())),
            Err(_) if !status.is_success() => Err(RpcError::Status(status.as_u16())),
            Err(source) => Err(RpcError::Decode {
                method: command.method.clone(),
                source,
            }),
        }
    }
}

/// Reads `user:password` from the first line of a bitcoind `.cookie` file.
fn read_cookie(path: &Path) -> Result<(String, String), RpcError> {
    let contents = fs::read_to_string(path).map_err(|source| RpcError::Cookie {
        path: path.to_path_buf(),
        source,
    })?;

    contents
        .lines()
        .next()
        .and_then(|line| line.split_once(':'))
        .map(|(user, pass)| (user.to_string(), pass.trim_end().to_string()))
        .ok_or_else(|| RpcError::MalformedCookie {
            path: path.to_path_buf(),
        })
}

//! Command-line and environment configuration.
//!
//! Every flag can also be set through a `BITCOIND_EXPORTER_*` environment
//! variable; flags win over the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use bitcoind::{ConfigError, DEFAULT_RPC_ADDR, RpcAuth, RpcConfig};
use clap::Parser;

/// Prometheus exporter for bitcoind.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bitcoind-exporter",
    version,
    about = "Exposes bitcoind chain, mempool, peer and index state as Prometheus metrics"
)]
pub struct Cli {
    // ── HTTP exposition ──────────────────────────────────────
    /// Address the metrics server listens on.
    #[arg(long, env = "BITCOIND_EXPORTER_LISTEN", default_value = "0.0.0.0:9142")]
    pub listen: SocketAddr,

    /// Path under which metrics are served.
    #[arg(
        long,
        env = "BITCOIND_EXPORTER_EXPORT_PATH",
        default_value = "/metrics",
        value_parser = parse_export_path
    )]
    pub export_path: String,

    /// How long to wait for in-flight scrapes on shutdown (e.g. `15s`, `1m`).
    #[arg(
        long,
        env = "BITCOIND_EXPORTER_SHUTDOWN_TIMEOUT",
        default_value = "15s",
        value_parser = humantime::parse_duration
    )]
    pub shutdown_timeout: Duration,

    /// Log level: trace, debug, info, warn, error or off.
    #[arg(long, env = "BITCOIND_EXPORTER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    // ── bitcoind RPC ─────────────────────────────────────────
    /// bitcoind RPC address as host:port.
    #[arg(long, env = "BITCOIND_EXPORTER_RPC_ADDR", default_value = DEFAULT_RPC_ADDR)]
    pub rpc_addr: String,

    /// Connect to the RPC server over plain HTTP.
    #[arg(long, env = "BITCOIND_EXPORTER_NO_RPC_TLS")]
    pub no_rpc_tls: bool,

    /// Open a new connection for every RPC call instead of keeping one alive.
    #[arg(long, env = "BITCOIND_EXPORTER_RPC_HTTP_POST")]
    pub rpc_http_post: bool,

    /// RPC user name.
    #[arg(long, env = "BITCOIND_EXPORTER_RPC_USER")]
    pub rpc_user: Option<String>,

    /// RPC password.
    #[arg(long, env = "BITCOIND_EXPORTER_RPC_PASS", hide_env_values = true)]
    pub rpc_pass: Option<String>,

    /// Path to the bitcoind `.cookie` file, re-read on every call.
    #[arg(
        long,
        env = "BITCOIND_EXPORTER_RPC_COOKIE",
        conflicts_with_all = ["rpc_user", "rpc_pass"]
    )]
    pub rpc_cookie: Option<PathBuf>,

    /// Per-call RPC timeout (e.g. `30s`). Unset means no client-side limit.
    #[arg(
        long,
        env = "BITCOIND_EXPORTER_RPC_TIMEOUT",
        value_parser = humantime::parse_duration
    )]
    pub rpc_timeout: Option<Duration>,
}

impl Cli {
    /// Builds the RPC client configuration from the parsed flags.
    pub fn rpc_config(&self) -> Result<RpcConfig, ConfigError> {
        let mut config = RpcConfig::new(self.rpc_addr.clone())?;
        config.tls = !self.no_rpc_tls;
        config.http_post = self.rpc_http_post;
        config.auth = RpcAuth::from_parts(
            self.rpc_user.clone(),
            self.rpc_pass.clone(),
            self.rpc_cookie.clone(),
        )?;
        config.timeout = self.rpc_timeout;
        Ok(config)
    }
}

fn parse_export_path(value: &str) -> Result<String, String> {
    if value.starts_with('/') {
        Ok(value.to_string())
    } else {
        Err(format!("export path must start with '/', got {value:?}"))
    }
}

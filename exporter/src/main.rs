//! bitcoind exporter binary.
//!
//! This binary connects to a bitcoind node over JSON-RPC and exposes its
//! state on a single HTTP route in the Prometheus text format:
//!
//! - `GET /metrics` (configurable with `--export-path`).
//!
//! Startup is strictly ordered: flags, logger, RPC connectivity check,
//! collector registration, listener bind, serve. Any failure before serving
//! exits with status 1. An interrupt starts a graceful drain bounded by
//! `--shutdown-timeout`; a second interrupt aborts it.

mod config;
mod routes;
mod server;
mod state;

use std::io;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use bitcoind::{
    ConfigError, Registry, RegistryError, RpcClient, RpcError, register_default_collectors,
};
use clap::Parser;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use config::Cli;
use server::ServeError;
use state::{AppState, SharedState};

/// Fatal errors; each one maps to exit status 1.
#[derive(Debug, Error)]
enum ExporterError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("unable to create RPC client: {0}")]
    Rpc(#[from] RpcError),
    #[error("failed to register collectors: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to build async runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] io::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Serve(#[from] ServeError),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures.
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let level: LevelFilter = match cli.log_level.parse() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("invalid log level {:?}: {e}", cli.log_level);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(level);

    match run(cli) {
        Ok(()) => {
            info!("Goodbye");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "exporter failed");
            ExitCode::FAILURE
        }
    }
}

/// JSON lines on stdout, filtered at `level`.
fn init_tracing(level: LevelFilter) {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::default().add_directive(level.into()))
        .with_writer(io::stdout)
        .init();
}

fn run(cli: Cli) -> Result<(), ExporterError> {
    let rpc_config = cli.rpc_config()?;
    info!(
        addr = %rpc_config.addr,
        tls = rpc_config.tls,
        http_post = rpc_config.http_post,
        auth = rpc_config.auth.mode(),
        "connecting to bitcoind"
    );

    // The blocking client must be created and pinged outside the runtime.
    let client = RpcClient::connect(&rpc_config)?;
    info!(endpoint = client.endpoint(), "connected to bitcoind");

    let mut registry = Registry::new()?;
    register_default_collectors(&mut registry, Arc::new(client))?;
    let state: SharedState = Arc::new(AppState { registry });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ExporterError::Runtime)?;

    let result = runtime.block_on(serve(cli, state));
    // Scrapes stuck in an RPC call must not hold up the exit.
    runtime.shutdown_background();
    result
}

async fn serve(cli: Cli, state: SharedState) -> Result<(), ExporterError> {
    let listener = TcpListener::bind(cli.listen)
        .await
        .map_err(|source| ExporterError::Bind {
            addr: cli.listen,
            source,
        })?;
    let local_addr = listener.local_addr().map_err(|source| ExporterError::Bind {
        addr: cli.listen,
        source,
    })?;

    let signals = ShutdownSignals::register().map_err(ExporterError::Signal)?;
    let shutdown = CancellationToken::new();
    let force = CancellationToken::new();
    tokio::spawn(watch_signals(signals, shutdown.clone(), force.clone()));

    let app = routes::router(state, &cli.export_path);
    info!(addr = %local_addr, path = %cli.export_path, "listening");

    server::serve(listener, app, shutdown, force, cli.shutdown_timeout).await?;
    Ok(())
}

/// Interrupt and terminate listeners.
///
/// Registered before the listener is announced so that a signal arriving
/// right after startup is never handled by the default disposition.
struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: signal::unix::Signal,
    #[cfg(unix)]
    terminate: signal::unix::Signal,
}

impl ShutdownSignals {
    #[cfg(unix)]
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    fn register() -> io::Result<Self> {
        Ok(Self {})
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        tokio::select! {
            _ = self.interrupt.recv() => {}
            _ = self.terminate.recv() => {}
        }

        #[cfg(not(unix))]
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}

/// Cancels `shutdown` on the first signal and `force` on the second.
async fn watch_signals(
    mut signals: ShutdownSignals,
    shutdown: CancellationToken,
    force: CancellationToken,
) {
    signals.recv().await;
    info!("shutdown signal received");
    shutdown.cancel();

    signals.recv().await;
    warn!("second shutdown signal received, aborting");
    force.cancel();
}

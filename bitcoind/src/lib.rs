//! bitcoind library crate.
//!
//! This crate provides the building blocks for exporting the state of a
//! bitcoind node as Prometheus metrics:
//!
//! - RPC connection configuration (`config`),
//! - a blocking JSON-RPC client and typed responses (`rpc`),
//! - the metric model and its `prometheus` registry (`metrics`),
//! - collectors for blockchain, mempool, peer and index state (`collectors`).
//!
//! Binaries compose these pieces: connect an [`RpcClient`], register the
//! collectors against it in a [`Registry`], and serve
//! [`Registry::encode_text`] over HTTP.

pub mod collectors;
pub mod config;
pub mod metrics;
pub mod rpc;

// Re-export connection configuration.
pub use config::{ConfigError, DEFAULT_RPC_ADDR, RpcAuth, RpcConfig};

// Re-export the RPC seam and its HTTP implementation.
pub use rpc::{NodeRpc, RpcClient, RpcCommand, RpcError};

// Re-export the metric model and registry.
pub use metrics::{
    Collector, Descriptor, MetricKind, Registry, RegistryError, Sample, ScrapeError, ScrapeMetrics,
};

// Re-export collectors.
pub use collectors::{BlockchainCollector, IndexCollector, MempoolCollector, PeersCollector};

/// Registers the blockchain, mempool, peers and index collectors, in that
/// order, all sharing `rpc`.
pub fn register_default_collectors<R>(registry: &mut Registry, rpc: R) -> Result<(), RegistryError>
where
    R: NodeRpc + Clone + 'static,
{
    registry.register(Box::new(BlockchainCollector::new(rpc.clone())))?;
    registry.register(Box::new(MempoolCollector::new(rpc.clone())))?;
    registry.register(Box::new(PeersCollector::new(rpc.clone())))?;
    registry.register(Box::new(IndexCollector::new(rpc)))?;
    Ok(())
}

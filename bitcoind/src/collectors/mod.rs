//! Collectors translating bitcoind RPC responses into metric samples.
//!
//! There is one collector per RPC call family:
//!
//! - [`blockchain::BlockchainCollector`]: `getblockchaininfo`,
//! - [`mempool::MempoolCollector`]: `getmempoolinfo`,
//! - [`peers::PeersCollector`]: `getpeerinfo`,
//! - [`index::IndexCollector`]: `getindexinfo`.
//!
//! Each is generic over a [`NodeRpc`] handle and holds no other state, so a
//! scrape is simply: fetch, decode, emit. The mempool, peers and index
//! collectors call `getblockchaininfo` first to obtain the `chain` label.

pub mod blockchain;
pub mod index;
pub mod mempool;
pub mod peers;

pub use blockchain::BlockchainCollector;
pub use index::IndexCollector;
pub use mempool::MempoolCollector;
pub use peers::PeersCollector;

use crate::metrics::{Descriptor, Sample, ScrapeError};
use crate::rpc::NodeRpc;

/// Fetches the network name used as the `chain` label.
fn chain_name<R: NodeRpc + ?Sized>(rpc: &R) -> Result<String, ScrapeError> {
    rpc.get_blockchain_info()
        .map(|info| info.chain)
        .map_err(|e| ScrapeError::new("getblockchaininfo", e))
}

/// Pushes one sample per `(descriptor, value)` pair, all sharing `labels`.
fn emit<const N: usize>(
    out: &mut Vec<Sample>,
    descriptors: &'static [Descriptor],
    values: [f64; N],
    labels: &[String],
) {
    for (descriptor, value) in descriptors.iter().zip(values) {
        out.push(Sample::new(descriptor, value, labels.to_vec()));
    }
}

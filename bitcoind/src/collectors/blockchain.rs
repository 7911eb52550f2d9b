//! Blockchain sync state from `getblockchaininfo`.

use tracing::debug;

use super::emit;
use crate::metrics::{Collector, Descriptor, Sample, ScrapeError, flag};
use crate::rpc::NodeRpc;

const LABELS: &[&str] = &["chain"];

/// Descriptors emitted by [`BlockchainCollector`], all labeled by `chain`.
pub static BLOCKCHAIN_DESCRIPTORS: [Descriptor; 9] = [
    Descriptor::counter(
        "bitcoind_blockchain_blocks",
        "Height of the most-work fully-validated chain",
        LABELS,
    ),
    Descriptor::counter(
        "bitcoind_blockchain_headers",
        "Current number of headers validated",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_blockchain_difficulty",
        "Current difficulty metric",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_blockchain_median_time",
        "Median time for the current best block",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_blockchain_verification_progress",
        "Estimate of verification progress on range [0..1]",
        LABELS,
    ),
    Descriptor::untyped(
        "bitcoind_initial_block_download",
        "Estimate of whether this node is in Initial Block Download mode",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_blockchain_size_on_disk",
        "Estimated size of the block and undo files on disk",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_blockchain_prune_height",
        "Lowest-height complete block stored if pruning is enabled",
        LABELS,
    ),
    Descriptor::untyped(
        "bitcoind_blockchain_pruned",
        "Pruning is enabled",
        LABELS,
    ),
];

/// Builds metrics from `getblockchaininfo` responses.
pub struct BlockchainCollector<R> {
    rpc: R,
}

impl<R> BlockchainCollector<R> {
    pub fn new(rpc: R) -> Self {
        Self { rpc }
    }
}

impl<R: NodeRpc> Collector for BlockchainCollector<R> {
    fn name(&self) -> &'static str {
        "blockchain"
    }

    fn describe(&self) -> &'static [Descriptor] {
        &BLOCKCHAIN_DESCRIPTORS
    }

    fn collect(&self, out: &mut Vec<Sample>) -> Result<(), ScrapeError> {
        debug!("collecting blockchain information");
        let info = self
            .rpc
            .get_blockchain_info()
            .map_err(|e| ScrapeError::new("getblockchaininfo", e))?;

        // Same order as BLOCKCHAIN_DESCRIPTORS.
        let values = [
            info.blocks as f64,
            info.headers as f64,
            info.difficulty,
            info.mediantime as f64,
            info.verificationprogress,
            flag(info.initialblockdownload),
            info.size_on_disk as f64,
            info.pruneheight as f64,
            flag(info.pruned),
        ];
        emit(out, &BLOCKCHAIN_DESCRIPTORS, values, &[info.chain]);
        Ok(())
    }
}

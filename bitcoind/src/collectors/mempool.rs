//! Mempool state from `getmempoolinfo`.

use tracing::debug;

use super::{chain_name, emit};
use crate::metrics::{Collector, Descriptor, Sample, ScrapeError, flag};
use crate::rpc::NodeRpc;

const LABELS: &[&str] = &["chain"];

/// Descriptors emitted by [`MempoolCollector`], all labeled by `chain`.
pub static MEMPOOL_DESCRIPTORS: [Descriptor; 10] = [
    Descriptor::gauge(
        "bitcoind_mempool_size",
        "Current mempool transaction count",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_mempool_bytes",
        "Sum of all virtual transaction sizes as defined in BIP 141. Differs from actual serialized size because witness data is discounted",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_mempool_usage",
        "Total memory usage for the mempool",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_mempool_total_fee",
        "Total fees for the mempool in BTC, ignoring modified fees through prioritisetransaction",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_mempool_max_bytes",
        "Maximum memory usage for the mempool",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_mempool_min_fee",
        "Minimum fee rate in BTC/kvB for transactions to be accepted. Is the maximum of minrelaytxfee and minimum mempool fee",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_mempool_min_relay_tx_fee",
        "Current minimum relay fee for transactions",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_mempool_incremental_relay_fee",
        "Minimum fee rate increment for mempool limiting or replacement in BTC/kvB",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_mempool_unbroadcast_count",
        "Current number of transactions that haven't passed initial broadcast yet",
        LABELS,
    ),
    Descriptor::untyped(
        "bitcoind_mempool_fullrbf",
        "True if the mempool accepts RBF without replaceability signaling inspection",
        LABELS,
    ),
];

/// Builds metrics from `getmempoolinfo` responses.
pub struct MempoolCollector<R> {
    rpc: R,
}

impl<R> MempoolCollector<R> {
    pub fn new(rpc: R) -> Self {
        Self { rpc }
    }
}

impl<R: NodeRpc> Collector for MempoolCollector<R> {
    fn name(&self) -> &'static str {
        "mempool"
    }

    fn describe(&self) -> &'static [Descriptor] {
        &MEMPOOL_DESCRIPTORS
    }

    fn collect(&self, out: &mut Vec<Sample>) -> Result<(), ScrapeError> {
        debug!("collecting mempool information");
        let chain = chain_name(&self.rpc)?;
        let info = self
            .rpc
            .get_mempool_info()
            .map_err(|e| ScrapeError::new("getmempoolinfo", e))?;

        // Same order as MEMPOOL_DESCRIPTORS.
        let values = [
            info.size as f64,
            info.bytes as f64,
            info.usage as f64,
            info.total_fee,
            info.maxmempool as f64,
            info.mempoolminfee,
            info.minrelaytxfee,
            info.incrementalrelayfee,
            info.unbroadcastcount as f64,
            flag(info.fullrbf),
        ];
        emit(out, &MEMPOOL_DESCRIPTORS, values, &[chain]);
        Ok(())
    }
}

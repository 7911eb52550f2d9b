//! Optional index state from `getindexinfo`.
//!
//! The response is a map keyed by index name (`txindex`,
//! `basic block filter index`, `coinstatsindex`); nodes running without any
//! optional index return an empty map and this collector emits nothing.

use tracing::debug;

use super::{chain_name, emit};
use crate::metrics::{Collector, Descriptor, Sample, ScrapeError, flag};
use crate::rpc::{IndexInfo, NodeRpc, RpcCommand, decode};

const LABELS: &[&str] = &["chain", "index"];

const METHOD: &str = "getindexinfo";

/// Descriptors emitted by [`IndexCollector`], labeled by `chain` and `index`.
pub static INDEX_DESCRIPTORS: [Descriptor; 2] = [
    Descriptor::untyped(
        "bitcoind_index_synced",
        "Whether the index is synced or not",
        LABELS,
    ),
    Descriptor::counter(
        "bitcoind_index_best_block_height",
        "The block height to which the index is synced",
        LABELS,
    ),
];

/// Builds metrics from `getindexinfo` responses.
pub struct IndexCollector<R> {
    rpc: R,
}

impl<R> IndexCollector<R> {
    pub fn new(rpc: R) -> Self {
        Self { rpc }
    }
}

impl<R: NodeRpc> Collector for IndexCollector<R> {
    fn name(&self) -> &'static str {
        "index"
    }

    fn describe(&self) -> &'static [Descriptor] {
        &INDEX_DESCRIPTORS
    }

    fn collect(&self, out: &mut Vec<Sample>) -> Result<(), ScrapeError> {
        debug!("collecting index information");
        let chain = chain_name(&self.rpc)?;
        let indexes: IndexInfo = self
            .rpc
            .send(&RpcCommand::new(METHOD))
            .and_then(|result| decode(METHOD, result))
            .map_err(|e| ScrapeError::new(METHOD, e))?;

        for (name, status) in &indexes {
            let values = [flag(status.synced), status.best_block_height as f64];
            emit(out, &INDEX_DESCRIPTORS, values, &[chain.clone(), name.clone()]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::{MockRpc, mainnet_blockchain_info};
    use serde_json::json;

    fn collector(indexes: serde_json::Value) -> IndexCollector<MockRpc> {
        IndexCollector::new(
            MockRpc::new()
                .with("getblockchaininfo", mainnet_blockchain_info())
                .with("getindexinfo", indexes),
        )
    }

    #[test]
    fn synced_and_unsynced_indexes() {
        let collector = collector(json!({
            "txindex": {"synced": true, "best_block_height": 800000},
            "coinstatsindex": {"synced": false, "best_block_height": 512}
        }));

        let mut samples = Vec::new();
        collector.collect(&mut samples).expect("collect");
        assert_eq!(samples.len(), 4);

        let find = |metric: &str, index: &str| {
            samples
                .iter()
                .find(|s| s.descriptor.name == metric && s.label("index") == Some(index))
                .map(|s| s.value)
                .unwrap_or_else(|| panic!("missing {metric}{{index={index}}}"))
        };

        assert_eq!(find("bitcoind_index_synced", "txindex"), 1.0);
        assert_eq!(find("bitcoind_index_synced", "coinstatsindex"), 0.0);
        assert_eq!(
            find("bitcoind_index_best_block_height", "txindex"),
            800_000.0
        );
        assert_eq!(
            find("bitcoind_index_best_block_height", "coinstatsindex"),
            512.0
        );
        assert!(samples.iter().all(|s| s.label("chain") == Some("main")));
    }

    #[test]
    fn repeated_collection_is_identical() {
        let collector = collector(json!({
            "txindex": {"synced": true, "best_block_height": 800000},
            "coinstatsindex": {"synced": false, "best_block_height": 512},
            "basic block filter index": {"synced": true, "best_block_height": 800000}
        }));

        let mut first = Vec::new();
        let mut second = Vec::new();
        collector.collect(&mut first).expect("first collect");
        collector.collect(&mut second).expect("second collect");
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn no_indexes_yields_no_samples() {
        let collector = collector(json!({}));

        let mut samples = Vec::new();
        collector.collect(&mut samples).expect("collect");
        assert!(samples.is_empty());
        assert_eq!(collector.rpc.calls(), ["getblockchaininfo", "getindexinfo"]);
    }

    #[test]
    fn malformed_response_is_a_decode_error() {
        let collector = collector(json!(["txindex"]));

        let mut samples = Vec::new();
        let err = collector.collect(&mut samples).unwrap_err();
        assert_eq!(err.method, "getindexinfo");
        assert!(matches!(err.source, crate::rpc::RpcError::Decode { .. }));
        assert!(samples.is_empty());
    }
}

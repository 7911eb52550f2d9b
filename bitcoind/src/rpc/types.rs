//! Typed bitcoind RPC responses.
//!
//! Every structure here decodes leniently: each field carries a default,
//! so responses from older daemons that lack a field decode to zero or
//! empty values instead of failing. Unknown fields are ignored.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Response of `getblockchaininfo`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlockchainInfo {
    /// Network name (`main`, `test`, `signet`, `regtest`).
    pub chain: String,
    /// Height of the most-work fully-validated chain.
    pub blocks: u64,
    /// Number of validated headers.
    pub headers: u64,
    pub difficulty: f64,
    /// Median time of the best block, UNIX epoch seconds.
    pub mediantime: i64,
    /// Estimated verification progress on `[0, 1]`.
    pub verificationprogress: f64,
    pub initialblockdownload: bool,
    /// Estimated size of block and undo files on disk, in bytes.
    pub size_on_disk: u64,
    pub pruned: bool,
    /// Lowest-height complete block stored; only reported when pruning.
    pub pruneheight: u64,
}

/// Response of `getmempoolinfo` (fields as of v24).
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MempoolInfo {
    /// Transaction count.
    pub size: u64,
    /// Sum of virtual transaction sizes (BIP 141).
    pub bytes: u64,
    /// Total memory usage.
    pub usage: u64,
    /// Total fees in BTC, ignoring `prioritisetransaction` modifications.
    pub total_fee: f64,
    /// Maximum memory usage.
    pub maxmempool: u64,
    /// Minimum fee rate (BTC/kvB) for a transaction to be accepted.
    pub mempoolminfee: f64,
    pub minrelaytxfee: f64,
    pub incrementalrelayfee: f64,
    pub unbroadcastcount: u64,
    pub fullrbf: bool,
}

/// One entry of the `getpeerinfo` response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PeerInfo {
    pub id: u64,
    pub addr: String,
    /// Network the peer connected through (`ipv4`, `ipv6`, `onion`, ...).
    pub network: String,
    pub subver: String,
    pub lastsend: i64,
    pub lastrecv: i64,
    pub last_transaction: i64,
    pub last_block: i64,
    pub bytessent: u64,
    pub bytesrecv: u64,
    pub timeoffset: i64,
    /// Seconds; absent until the first pong arrives.
    pub pingtime: f64,
    pub minping: f64,
    pub startingheight: i64,
    /// `-1` when no low-work header sync is in progress.
    pub presynced_headers: i64,
    pub synced_headers: i64,
    pub synced_blocks: i64,
    pub addr_processed: u64,
    pub addr_rate_limited: u64,
    pub bytessent_per_msg: BTreeMap<String, u64>,
    pub bytesrecv_per_msg: BTreeMap<String, u64>,
}

/// Status of one index in the `getindexinfo` response.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexStatus {
    pub synced: bool,
    pub best_block_height: i64,
}

/// Response of `getindexinfo`: index name (`txindex`, `coinstatsindex`,
/// ...) to its sync status.
pub type IndexInfo = BTreeMap<String, IndexStatus>;

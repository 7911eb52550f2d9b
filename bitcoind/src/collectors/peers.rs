//! Per-peer connection state from `getpeerinfo`.
//!
//! Every peer contributes one sample per scalar descriptor, labeled with the
//! chain and the peer's identity, plus one sample per wire message type for
//! the bytes-sent and bytes-received breakdowns. Cardinality therefore grows
//! with `peers × message types`.
//!
//! Fields missing from older daemons decode as zero and are still emitted.

use tracing::debug;

use super::{chain_name, emit};
use crate::metrics::{Collector, Descriptor, Sample, ScrapeError};
use crate::rpc::{NodeRpc, PeerInfo};

const LABELS: &[&str] = &["chain", "peer_id", "peer_addr", "peer_transport", "peer_version"];

const MSG_LABELS: &[&str] = &[
    "chain",
    "peer_id",
    "peer_addr",
    "peer_transport",
    "peer_version",
    "msg_type",
];

/// Number of leading entries in [`PEER_DESCRIPTORS`] emitted once per peer.
pub const SCALAR_PEER_METRICS: usize = 15;

/// Descriptors emitted by [`PeersCollector`].
///
/// The first [`SCALAR_PEER_METRICS`] are per-peer scalars; the last two are
/// the per-message-type breakdowns with the extra `msg_type` label.
pub static PEER_DESCRIPTORS: [Descriptor; 17] = [
    Descriptor::gauge(
        "bitcoind_peer_last_send",
        "UNIX epoch time of the last message sent to the peer",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_peer_last_recv",
        "UNIX epoch time of the last message received from the peer",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_peer_last_transaction",
        "UNIX epoch time of the last valid transaction received from the peer",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_peer_last_block",
        "UNIX epoch time of the last block received from the peer",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_peer_bytes_sent",
        "Total bytes sent to the peer",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_peer_bytes_recv",
        "Total bytes received from the peer",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_peer_time_offset",
        "Time offset in seconds from the peer",
        LABELS,
    ),
    Descriptor::gauge("bitcoind_peer_ping_time", "Ping time to the peer", LABELS),
    Descriptor::gauge(
        "bitcoind_peer_ping_min",
        "Minimum observed ping time to the peer",
        LABELS,
    ),
    Descriptor::gauge(
        "bitcoind_peer_starting_height",
        "Starting height (block) of the peer",
        LABELS,
    ),
    Descriptor::counter(
        "bitcoind_peer_presynced_headers",
        "Current height of header pre-synchronization with this peer, or -1 if no low-work sync is in progress",
        LABELS,
    ),
    Descriptor::counter(
        "bitcoind_peer_synced_headers",
        "Last header we have in common with the peer",
        LABELS,
    ),
    Descriptor::counter(
        "bitcoind_peer_synced_blocks",
        "Last block we have in common with the peer",
        LABELS,
    ),
    Descriptor::counter(
        "bitcoind_peer_addr_processed",
        "Total number of addresses processed, excluding those dropped due to rate limiting",
        LABELS,
    ),
    Descriptor::counter(
        "bitcoind_peer_addr_rate_limited",
        "Total number of addresses dropped due to rate limiting",
        LABELS,
    ),
    Descriptor::counter(
        "bitcoind_peer_bytes_sent_per_msg",
        "Total bytes sent to the peer aggregated by message type",
        MSG_LABELS,
    ),
    Descriptor::counter(
        "bitcoind_peer_bytes_recv_per_msg",
        "Total bytes received from the peer aggregated by message type",
        MSG_LABELS,
    ),
];

/// Builds metrics from `getpeerinfo` responses.
pub struct PeersCollector<R> {
    rpc: R,
}

impl<R> PeersCollector<R> {
    pub fn new(rpc: R) -> Self {
        Self { rpc }
    }
}

impl<R: NodeRpc> Collector for PeersCollector<R> {
    fn name(&self) -> &'static str {
        "peers"
    }

    fn describe(&self) -> &'static [Descriptor] {
        &PEER_DESCRIPTORS
    }

    fn collect(&self, out: &mut Vec<Sample>) -> Result<(), ScrapeError> {
        debug!("collecting peer information");
        let chain = chain_name(&self.rpc)?;
        let peers = self
            .rpc
            .get_peer_info()
            .map_err(|e| ScrapeError::new("getpeerinfo", e))?;

        for peer in &peers {
            emit_peer(out, &chain, peer);
        }
        Ok(())
    }
}

fn emit_peer(out: &mut Vec<Sample>, chain: &str, peer: &PeerInfo) {
    let labels = vec![
        chain.to_string(),
        format!("{:x}", peer.id),
        peer.addr.clone(),
        peer.network.clone(),
        peer.subver.clone(),
    ];

    // Same order as PEER_DESCRIPTORS.
    let values = [
        peer.lastsend as f64,
        peer.lastrecv as f64,
        peer.last_transaction as f64,
        peer.last_block as f64,
        peer.bytessent as f64,
        peer.bytesrecv as f64,
        peer.timeoffset as f64,
        peer.pingtime,
        peer.minping,
        peer.startingheight as f64,
        peer.presynced_headers as f64,
        peer.synced_headers as f64,
        peer.synced_blocks as f64,
        peer.addr_processed as f64,
        peer.addr_rate_limited as f64,
    ];
    emit(out, &PEER_DESCRIPTORS[..SCALAR_PEER_METRICS], values, &labels);

    let breakdowns = [
        (&PEER_DESCRIPTORS[SCALAR_PEER_METRICS], &peer.bytessent_per_msg),
        (&PEER_DESCRIPTORS[SCALAR_PEER_METRICS + 1], &peer.bytesrecv_per_msg),
    ];
    for (descriptor, per_msg) in breakdowns {
        for (msg_type, bytes) in per_msg {
            let mut msg_labels = labels.clone();
            msg_labels.push(msg_type.clone());
            out.push(Sample::new(descriptor, *bytes as f64, msg_labels));
        }
    }
}

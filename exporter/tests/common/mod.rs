//! In-process bitcoind JSON-RPC daemon for end-to-end tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};
use tokio::runtime::Runtime;

pub struct MockDaemon {
    pub addr: SocketAddr,
    _runtime: Runtime,
}

impl MockDaemon {
    /// Serves `results` keyed by method name; unknown methods get a
    /// JSON-RPC error with HTTP 500, as bitcoind does.
    pub fn start(results: HashMap<&'static str, Value>) -> Self {
        Self::start_with_delays(results, HashMap::new())
    }

    /// Like [`MockDaemon::start`], but holds the answer to each method in
    /// `delays` for the given duration.
    pub fn start_with_delays(
        results: HashMap<&'static str, Value>,
        delays: HashMap<&'static str, Duration>,
    ) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("build daemon runtime");
        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .expect("bind daemon");
        let addr = listener.local_addr().expect("daemon addr");

        let app = Router::new()
            .route("/", post(handle))
            .with_state(Arc::new(Node { results, delays }));
        runtime.spawn(async move { axum::serve(listener, app).await });

        Self {
            addr,
            _runtime: runtime,
        }
    }
}

struct Node {
    results: HashMap<&'static str, Value>,
    delays: HashMap<&'static str, Duration>,
}

async fn handle(
    State(node): State<Arc<Node>>,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default();
    if let Some(delay) = node.delays.get(method) {
        tokio::time::sleep(*delay).await;
    }
    match node.results.get(method) {
        Some(result) => (
            StatusCode::OK,
            Json(json!({"result": result, "error": null, "id": id})),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "result": null,
                "error": {"code": -32601, "message": "Method not found"},
                "id": id
            })),
        ),
    }
}

/// A mainnet node with one peer and a synced transaction index.
pub fn mainnet_node() -> HashMap<&'static str, Value> {
    HashMap::from([
        ("ping", Value::Null),
        (
            "getblockchaininfo",
            json!({
                "chain": "main",
                "blocks": 800000,
                "headers": 800000,
                "difficulty": 5.2e13,
                "mediantime": 1700000000,
                "verificationprogress": 0.9999,
                "initialblockdownload": false,
                "size_on_disk": 600000000000u64,
                "pruned": false
            }),
        ),
        (
            "getmempoolinfo",
            json!({"loaded": true, "size": 4200, "bytes": 2100000, "fullrbf": false}),
        ),
        (
            "getpeerinfo",
            json!([{
                "id": 7,
                "addr": "1.2.3.4:8333",
                "network": "ipv4",
                "subver": "/Satoshi:24.0/",
                "bytessent_per_msg": {"inv": 1000}
            }]),
        ),
        (
            "getindexinfo",
            json!({"txindex": {"synced": true, "best_block_height": 800000}}),
        ),
    ])
}

/// A loopback port with nothing listening on it.
pub fn closed_port() -> SocketAddr {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("reserve port")
}

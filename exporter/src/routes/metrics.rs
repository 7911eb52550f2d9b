use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::state::SharedState;

/// Content type of the Prometheus text exposition format. Served for every
/// `Accept` header, OpenMetrics included.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// `GET <export-path>`
///
/// Runs every collector against the node and renders the result. Collector
/// failures only shrink the payload; the response is still `200 OK`.
pub async fn metrics(State(state): State<SharedState>) -> Response {
    // The RPC client blocks, so the scrape runs off the async workers.
    match tokio::task::spawn_blocking(move || state.registry.encode_text()).await {
        Ok(Ok(body)) => ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            error!(error = %e, "scrape task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

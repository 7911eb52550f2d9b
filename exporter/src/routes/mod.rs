//! HTTP routes.

pub mod metrics;

use axum::{Router, routing::get};

use crate::state::SharedState;

/// Builds the exposition router: a single `GET` route at `path`.
pub fn router(state: SharedState, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics::metrics))
        .with_state(state)
}

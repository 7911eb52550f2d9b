//! Shared application state.

use std::sync::Arc;

use bitcoind::Registry;

/// State handed to request handlers via Axum's `State` extractor.
pub struct AppState {
    /// Collectors for the configured node, populated once at startup.
    pub registry: Registry,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;

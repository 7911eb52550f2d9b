//! Metric model, collector registry and exposition.
//!
//! Collectors declare a static table of [`Descriptor`]s and produce fresh
//! [`Sample`]s on every scrape. The [`Registry`] adapts them to the
//! `prometheus` collector interface, keeps them in one `prometheus::Registry`
//! next to the exporter's own [`ScrapeMetrics`] and renders the payload with
//! `TextEncoder`.
//!
//! Typical usage in a binary:
//!
//! ```ignore
//! use std::sync::Arc;
//! use bitcoind::{BlockchainCollector, Registry, RpcClient, RpcConfig};
//!
//! let client = Arc::new(RpcClient::connect(&RpcConfig::default())?);
//! let mut registry = Registry::new()?;
//! registry.register(Box::new(BlockchainCollector::new(client.clone())))?;
//!
//! // On each scrape, from a blocking context:
//! let body = registry.encode_text()?;
//! ```

pub mod exporter;
pub mod registry;
pub mod types;

pub use exporter::ScrapeMetrics;
pub use registry::{Collector, Registry, RegistryError, ScrapeError};
pub use types::{Descriptor, MetricKind, Sample, flag};

//! Collector registry backed by a `prometheus::Registry`.
//!
//! Each [`Collector`] is wrapped in a `prometheus::core::Collector` that
//! converts its samples into const metrics and carries its
//! [`ScrapeMetrics`]. Node collectors, scrape metrics and process metrics
//! all live in one `prometheus::Registry`, so a name clash between any of
//! them is rejected at registration and the payload is rendered once by
//! `TextEncoder`.
//!
//! The registry is populated once at startup and is read-only afterwards,
//! so it can be shared behind an `Arc` by every concurrent scrape.

use std::time::Instant;

use prometheus::core::{Collector as _, Desc};
use prometheus::proto::{Metric, MetricFamily};
use prometheus::{Encoder, TextEncoder};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::metrics::exporter::{ScrapeMetrics, register_process_metrics};
use crate::metrics::types::{Descriptor, Sample};
use crate::rpc::RpcError;

/// A collector failed part-way through a scrape.
#[derive(Debug, Error)]
#[error("rpc call {method} failed: {source}")]
pub struct ScrapeError {
    /// RPC method that failed.
    pub method: &'static str,
    #[source]
    pub source: RpcError,
}

impl ScrapeError {
    pub fn new(method: &'static str, source: RpcError) -> Self {
        Self { method, source }
    }
}

/// Produces samples from a fixed, statically known set of descriptors.
pub trait Collector: Send + Sync {
    /// Name used in logs and as the `collector` label of the scrape metrics.
    fn name(&self) -> &'static str;

    /// Every descriptor this collector may emit. Must return the same set on
    /// every call.
    fn describe(&self) -> &'static [Descriptor];

    /// Fetches fresh data and appends samples to `out`.
    ///
    /// On error, samples already appended are kept.
    fn collect(&self, out: &mut Vec<Sample>) -> Result<(), ScrapeError>;
}

/// Errors raised while building the registry or registering collectors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to register collector {collector}: {source}")]
    Collector {
        collector: &'static str,
        #[source]
        source: prometheus::Error,
    },
    #[error("failed to register process metrics: {0}")]
    Process(#[source] prometheus::Error),
    #[error("failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),
}

/// Node collectors plus the exporter's own metrics, in one
/// `prometheus::Registry`.
pub struct Registry {
    inner: prometheus::Registry,
    collectors: Vec<&'static str>,
}

impl Registry {
    /// Creates a registry holding only the process metrics.
    pub fn new() -> Result<Self, RegistryError> {
        let inner = prometheus::Registry::new();
        register_process_metrics(&inner).map_err(RegistryError::Process)?;
        Ok(Self {
            inner,
            collectors: Vec::new(),
        })
    }

    /// Registers a collector together with its scrape metrics.
    ///
    /// Fails if a metric or label name is invalid, or if any declared
    /// family clashes with one already registered, including the exporter's
    /// own `bitcoind_exporter_*` and `process_*` families.
    pub fn register(&mut self, collector: Box<dyn Collector>) -> Result<(), RegistryError> {
        let name = collector.name();
        let wrap_err = |source: prometheus::Error| RegistryError::Collector {
            collector: name,
            source,
        };

        let instrumented = Instrumented::new(collector).map_err(wrap_err)?;
        self.inner
            .register(Box::new(instrumented))
            .map_err(wrap_err)?;
        self.collectors.push(name);
        Ok(())
    }

    /// Number of registered collectors.
    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// The underlying `prometheus` registry.
    pub fn inner(&self) -> &prometheus::Registry {
        &self.inner
    }

    /// Runs every collector once and returns all families, sorted by name.
    ///
    /// A failing collector is logged and contributes only the samples it
    /// produced before failing; the others are unaffected.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.inner.gather()
    }

    /// Scrapes all collectors and renders the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, RegistryError> {
        let metric_families = self.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(RegistryError::Encode)?;
        // TextEncoder only writes UTF-8.
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// A node collector exposed through the `prometheus` collector interface.
struct Instrumented {
    collector: Box<dyn Collector>,
    descs: Vec<Desc>,
    scrape: ScrapeMetrics,
}

impl Instrumented {
    fn new(collector: Box<dyn Collector>) -> prometheus::Result<Self> {
        let descs = collector
            .describe()
            .iter()
            .map(Descriptor::desc)
            .collect::<prometheus::Result<Vec<_>>>()?;
        let scrape = ScrapeMetrics::new(collector.name())?;
        Ok(Self {
            collector,
            descs,
            scrape,
        })
    }

    /// Groups samples into families in declaration order. Samples for
    /// undeclared descriptors or with the wrong number of label values are
    /// dropped.
    fn families(&self, samples: Vec<Sample>) -> Vec<MetricFamily> {
        let name = self.collector.name();
        let declared = self.collector.describe();
        let mut grouped: Vec<Vec<Metric>> = vec![Vec::new(); declared.len()];

        for sample in samples {
            let Some(index) = declared
                .iter()
                .position(|descriptor| descriptor.name == sample.descriptor.name)
            else {
                warn!(
                    collector = name,
                    metric = sample.descriptor.name,
                    "dropping sample for undeclared metric"
                );
                continue;
            };

            if sample.label_values.len() != declared[index].labels.len() {
                warn!(
                    collector = name,
                    metric = sample.descriptor.name,
                    expected = declared[index].labels.len(),
                    got = sample.label_values.len(),
                    "dropping sample with mismatched label values"
                );
                continue;
            }

            grouped[index].push(sample.into_metric());
        }

        declared
            .iter()
            .zip(grouped)
            .filter(|(_, metrics)| !metrics.is_empty())
            .map(|(descriptor, metrics)| descriptor.family(metrics))
            .collect()
    }
}

impl prometheus::core::Collector for Instrumented {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs: Vec<&Desc> = self.descs.iter().collect();
        descs.extend(self.scrape.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let name = self.collector.name();
        let started = Instant::now();
        let mut samples = Vec::new();
        let result = self.collector.collect(&mut samples);
        self.scrape.observe(started.elapsed(), result.is_ok());

        match &result {
            Ok(()) => debug!(collector = name, samples = samples.len(), "collected"),
            Err(err) => error!(
                collector = name,
                method = err.method,
                error = %err.source,
                "RPC call failed"
            ),
        }

        let mut families = self.families(samples);
        families.extend(self.scrape.collect());
        families
    }
}

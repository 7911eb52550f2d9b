//! Prometheus-backed metrics about the exporter itself.
//!
//! Every registered collector carries a [`ScrapeMetrics`] set, labeled with
//! the collector's name as a const label. The registry collects it right
//! after the collector runs, so a payload always reports the outcome of the
//! scrape that produced it. On Linux the standard `process_*` metrics are
//! registered alongside.

use std::time::Duration;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};

/// Scrape instrumentation for one collector.
#[derive(Clone)]
pub struct ScrapeMetrics {
    /// Time spent in the collector per scrape, in seconds.
    pub duration_seconds: Histogram,
    /// Number of scrapes in which the collector failed.
    pub errors_total: IntCounter,
    /// Whether the collector's most recent scrape succeeded (1) or not (0).
    pub success: IntGauge,
}

impl ScrapeMetrics {
    pub fn new(collector: &str) -> Result<Self, prometheus::Error> {
        // RPC round trips to a local daemon; slow peers lists can take seconds.
        let duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "bitcoind_exporter_scrape_duration_seconds",
                "Time spent collecting metrics from bitcoind, per collector, in seconds",
            )
            .const_label("collector", collector)
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
        )?;

        let errors_total = IntCounter::with_opts(
            Opts::new(
                "bitcoind_exporter_scrape_errors_total",
                "Total number of scrapes in which a collector failed",
            )
            .const_label("collector", collector),
        )?;

        let success = IntGauge::with_opts(
            Opts::new(
                "bitcoind_exporter_scrape_success",
                "Whether the collector's most recent scrape succeeded",
            )
            .const_label("collector", collector),
        )?;

        Ok(Self {
            duration_seconds,
            errors_total,
            success,
        })
    }

    /// Records the outcome of one collector run.
    pub fn observe(&self, elapsed: Duration, ok: bool) {
        self.duration_seconds.observe(elapsed.as_secs_f64());
        self.success.set(i64::from(ok));
        if !ok {
            self.errors_total.inc();
        }
    }
}

impl Collector for ScrapeMetrics {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.duration_seconds.desc();
        descs.extend(self.errors_total.desc());
        descs.extend(self.success.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut families = self.duration_seconds.collect();
        families.extend(self.errors_total.collect());
        families.extend(self.success.collect());
        families
    }
}

/// Registers the `process_*` metrics where the platform supports them.
pub fn register_process_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    #[cfg(target_os = "linux")]
    registry.register(Box::new(
        prometheus::process_collector::ProcessCollector::for_self(),
    ))?;

    #[cfg(not(target_os = "linux"))]
    let _ = registry;

    Ok(())
}

use std::collections::HashMap;

use prometheus::core::Desc;
use prometheus::proto::{self, LabelPair, Metric, MetricFamily, MetricType};

/// Prometheus metric kind of a descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Untyped,
}

impl MetricKind {
    /// Exposition type. `TextEncoder` cannot write untyped families, so
    /// 0/1 flags are exposed as gauges.
    pub fn metric_type(self) -> MetricType {
        match self {
            Self::Counter => MetricType::COUNTER,
            Self::Gauge | Self::Untyped => MetricType::GAUGE,
        }
    }
}

/// Static metadata identifying a metric family.
///
/// Descriptors are declared as `static` tables by each collector so the set
/// a collector can emit is known without contacting the node.
#[derive(Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
    pub kind: MetricKind,
}

impl Descriptor {
    pub const fn counter(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            labels,
            kind: MetricKind::Counter,
        }
    }

    pub const fn gauge(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            labels,
            kind: MetricKind::Gauge,
        }
    }

    pub const fn untyped(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            labels,
            kind: MetricKind::Untyped,
        }
    }

    /// Builds the `prometheus` descriptor, validating the metric and label
    /// names.
    pub fn desc(&self) -> prometheus::Result<Desc> {
        Desc::new(
            self.name.to_string(),
            self.help.to_string(),
            self.labels.iter().map(|label| label.to_string()).collect(),
            HashMap::new(),
        )
    }

    /// Wraps `metrics` into a family carrying this descriptor's name, help
    /// and type.
    pub fn family(&self, metrics: Vec<Metric>) -> MetricFamily {
        let mut family = MetricFamily::new();
        family.set_name(self.name.to_string());
        family.set_help(self.help.to_string());
        family.set_field_type(self.kind.metric_type());
        family.set_metric(metrics);
        family
    }
}

/// One realized value for a descriptor, valid for a single scrape.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub descriptor: &'static Descriptor,
    pub value: f64,
    /// Values for `descriptor.labels`, in the same order.
    pub label_values: Vec<String>,
}

impl Sample {
    pub fn new(descriptor: &'static Descriptor, value: f64, label_values: Vec<String>) -> Self {
        Self {
            descriptor,
            value,
            label_values,
        }
    }

    /// Looks up a label value by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.descriptor
            .labels
            .iter()
            .position(|label| *label == name)
            .and_then(|index| self.label_values.get(index))
            .map(String::as_str)
    }

    /// Converts into a const metric of the descriptor's kind.
    pub fn into_metric(self) -> Metric {
        let labels = self
            .descriptor
            .labels
            .iter()
            .zip(self.label_values)
            .map(|(name, value)| {
                let mut pair = LabelPair::new();
                pair.set_name(name.to_string());
                pair.set_value(value);
                pair
            })
            .collect();

        let mut metric = Metric::from_label(labels);
        match self.descriptor.kind {
            MetricKind::Counter => {
                let mut counter = proto::Counter::new();
                counter.set_value(self.value);
                metric.set_counter(counter);
            }
            MetricKind::Gauge | MetricKind::Untyped => {
                let mut gauge = proto::Gauge::new();
                gauge.set_value(self.value);
                metric.set_gauge(gauge);
            }
        }
        metric
    }
}

/// Renders a boolean as the `0`/`1` value used by flag metrics.
pub fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    static HEIGHT: Descriptor = Descriptor::counter("test_height", "Height", &["chain"]);
    static IBD: Descriptor = Descriptor::untyped("test_ibd", "In IBD", &["chain"]);

    #[test]
    fn untyped_flags_become_gauges() {
        let metric = Sample::new(&IBD, 1.0, vec!["main".into()]).into_metric();
        assert_eq!(metric.get_gauge().value(), 1.0);
        assert_eq!(IBD.family(vec![metric]).get_field_type(), MetricType::GAUGE);
    }

    #[test]
    fn counters_keep_labels_in_declared_order() {
        let metric = Sample::new(&HEIGHT, 800_000.0, vec!["main".into()]).into_metric();
        assert_eq!(metric.get_counter().value(), 800_000.0);
        let labels: Vec<_> = metric
            .get_label()
            .iter()
            .map(|pair| (pair.name(), pair.value()))
            .collect();
        assert_eq!(labels, [("chain", "main")]);
    }

    #[test]
    fn desc_rejects_invalid_identifiers() {
        assert!(HEIGHT.desc().is_ok());
        assert!(Descriptor::gauge("9lives", "Bad name", &[]).desc().is_err());
        assert!(Descriptor::gauge("test_ok", "Bad label", &["peer-id"]).desc().is_err());
        assert!(Descriptor::gauge("test_ok", "", &[]).desc().is_err());
    }
}

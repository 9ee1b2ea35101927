//! Gathered snapshot types.
//!
//! A gather produces owned, immutable families; nothing here points back into
//! live metric state.

use crate::labels::LabelPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// Point-in-time histogram state with cumulative bucket counts.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// `(upper_bound, cumulative_count)`, ascending; `+Inf` is implied by `count`.
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Counter(f64),
    Gauge(f64),
    Histogram(HistogramSnapshot),
}

/// One sample (or histogram sample set) with its labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub labels: Vec<LabelPair>,
    pub value: MetricValue,
}

impl Metric {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub metrics: Vec<Metric>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, help: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            metrics: Vec::new(),
        }
    }

    /// Convenience for collectors emitting a single unlabeled value.
    pub fn single(name: impl Into<String>, help: impl Into<String>, kind: MetricKind, value: f64) -> Self {
        let value = match kind {
            MetricKind::Counter => MetricValue::Counter(value),
            _ => MetricValue::Gauge(value),
        };
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            metrics: vec![Metric {
                labels: Vec::new(),
                value,
            }],
        }
    }

    /// Find the sample whose labels contain every `(name, value)` given.
    pub fn find(&self, labels: &[(&str, &str)]) -> Option<&Metric> {
        self.metrics
            .iter()
            .find(|m| labels.iter().all(|(k, v)| m.label(k) == Some(*v)))
    }
}

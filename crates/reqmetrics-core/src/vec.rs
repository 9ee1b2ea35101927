//! Label-parameterized metric vectors.
//!
//! A vector owns a `DashMap` from label-value tuple to child metric. Children
//! are created on first use through `entry().or_insert_with`, so concurrent
//! first-use of the same tuple yields exactly one child. Children are never
//! removed.
//!
//! Each vector comes in two flavours of write API:
//! - `inc` / `observe` / `with_label_values`: panic on arity mismatch (caller
//!   bug), log and drop anything else. Past the cardinality cap
//!   `with_label_values` hands out a detached child that is never exported.
//! - `try_inc` / `try_observe` / `get_metric_with_label_values`: never panic,
//!   return the error instead. The request interceptors use these.

use std::sync::Arc;

use dashmap::DashMap;

use crate::collector::Collector;
use crate::error::{MetricsError, Result};
use crate::family::{Metric, MetricFamily, MetricKind, MetricValue};
use crate::labels::{fq_name, validate_metric_name, LabelSchema};
use crate::metric::{validate_buckets, Counter, Histogram, DEFAULT_BUCKETS};
use crate::registry::Registry;

/// Options shared by every vector kind.
#[derive(Debug, Clone, Default)]
pub struct Opts {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
    pub help: String,
    pub labels: Vec<String>,
    /// Upper bound on live children; `None` means unbounded.
    pub max_cardinality: Option<usize>,
}

impl Opts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    pub fn subsystem(mut self, sub: impl Into<String>) -> Self {
        self.subsystem = sub.into();
        self
    }

    pub fn labels(mut self, names: &[&str]) -> Self {
        self.labels = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn max_cardinality(mut self, limit: usize) -> Self {
        self.max_cardinality = Some(limit);
        self
    }

    pub fn fq_name(&self) -> String {
        fq_name(&self.namespace, &self.subsystem, &self.name)
    }
}

#[derive(Debug, Clone)]
pub struct HistogramOpts {
    pub common: Opts,
    pub buckets: Vec<f64>,
}

impl HistogramOpts {
    pub fn new(common: Opts) -> Self {
        Self {
            common,
            buckets: DEFAULT_BUCKETS.to_vec(),
        }
    }

    pub fn buckets(mut self, buckets: &[f64]) -> Self {
        self.buckets = buckets.to_vec();
        self
    }
}

struct VecCore<T> {
    fq_name: String,
    help: String,
    schema: LabelSchema,
    max_cardinality: Option<usize>,
    children: DashMap<Vec<String>, Arc<T>>,
}

impl<T> VecCore<T> {
    fn new(opts: &Opts, reserved: &[&str]) -> Result<Self> {
        let fq_name = opts.fq_name();
        validate_metric_name(&fq_name)?;
        Ok(Self {
            fq_name,
            help: opts.help.clone(),
            schema: LabelSchema::new(&opts.labels, reserved)?,
            max_cardinality: opts.max_cardinality,
            children: DashMap::new(),
        })
    }

    fn get_or_create(&self, values: &[&str], make: impl FnOnce() -> T) -> Result<Arc<T>> {
        let key = self.schema.key(values)?;
        if let Some(child) = self.children.get(&key) {
            return Ok(Arc::clone(child.value()));
        }

        // Best effort under concurrent inserts: may overshoot by the number of racing writers.
        if let Some(limit) = self.max_cardinality {
            if self.children.len() >= limit {
                return Err(MetricsError::CardinalityExceeded {
                    metric: self.fq_name.clone(),
                    limit,
                });
            }
        }

        let child = self.children.entry(key).or_insert_with(|| Arc::new(make()));
        Ok(Arc::clone(child.value()))
    }

    fn family(&self, kind: MetricKind, value: impl Fn(&T) -> MetricValue) -> MetricFamily {
        let mut fam = MetricFamily::new(self.fq_name.clone(), self.help.clone(), kind);
        fam.metrics = self
            .children
            .iter()
            .map(|e| Metric {
                labels: self.schema.pairs(e.key()),
                value: value(e.value().as_ref()),
            })
            .collect();
        fam
    }
}

#[allow(clippy::panic)]
fn fail_write(fq_name: &str, err: MetricsError) {
    match err {
        MetricsError::InconsistentCardinality { .. } => panic!("{fq_name}: {err}"),
        other => tracing::warn!(metric = %fq_name, error = %other, "observation dropped"),
    }
}

#[allow(clippy::panic)]
fn must<T>(fq_name: &str, res: Result<T>) -> T {
    match res {
        Ok(v) => v,
        Err(e) => panic!("{fq_name}: {e}"),
    }
}

/// Child lookup for the panicking API: arity mismatch is fatal, a cap hit
/// yields a detached child whose writes go nowhere.
fn child_or_detached<T>(fq_name: &str, res: Result<Arc<T>>, detached: impl FnOnce() -> T) -> Arc<T> {
    match res {
        Ok(child) => child,
        Err(e) => {
            fail_write(fq_name, e);
            Arc::new(detached())
        }
    }
}

/// Family of counters keyed by label values. Cheap to clone.
#[derive(Clone)]
pub struct CounterVec {
    inner: Arc<VecCore<Counter>>,
}

impl CounterVec {
    /// Build the vector and register it into `registry`.
    pub fn new(registry: &Registry, opts: Opts) -> Result<Self> {
        let v = Self {
            inner: Arc::new(VecCore::new(&opts, &[])?),
        };
        registry.register(Arc::new(v.clone()))?;
        Ok(v)
    }

    /// Like `new`, but a schema problem or duplicate name aborts startup.
    pub fn must_new(registry: &Registry, opts: Opts) -> Self {
        let name = opts.fq_name();
        must(&name, Self::new(registry, opts))
    }

    pub fn fq_name(&self) -> &str {
        &self.inner.fq_name
    }

    pub fn label_names(&self) -> &[String] {
        self.inner.schema.names()
    }

    /// Number of live children.
    pub fn len(&self) -> usize {
        self.inner.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.children.is_empty()
    }

    pub fn get_metric_with_label_values(&self, values: &[&str]) -> Result<Arc<Counter>> {
        self.inner.get_or_create(values, Counter::new)
    }

    pub fn with_label_values(&self, values: &[&str]) -> Arc<Counter> {
        child_or_detached(
            &self.inner.fq_name,
            self.get_metric_with_label_values(values),
            Counter::new,
        )
    }

    pub fn try_inc(&self, values: &[&str]) -> Result<()> {
        self.get_metric_with_label_values(values)?.inc();
        Ok(())
    }

    pub fn inc(&self, values: &[&str]) {
        if let Err(e) = self.try_inc(values) {
            fail_write(&self.inner.fq_name, e);
        }
    }
}

impl Collector for CounterVec {
    fn describe(&self) -> Vec<String> {
        vec![self.inner.fq_name.clone()]
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        Ok(vec![self
            .inner
            .family(MetricKind::Counter, |c| MetricValue::Counter(c.get() as f64))])
    }
}

/// Family of histograms keyed by label values. Cheap to clone.
#[derive(Clone)]
pub struct HistogramVec {
    inner: Arc<VecCore<Histogram>>,
    buckets: Arc<[f64]>,
}

impl HistogramVec {
    pub fn new(registry: &Registry, opts: HistogramOpts) -> Result<Self> {
        validate_buckets(&opts.buckets)?;
        let v = Self {
            inner: Arc::new(VecCore::new(&opts.common, &["le"])?),
            buckets: opts.buckets.into(),
        };
        registry.register(Arc::new(v.clone()))?;
        Ok(v)
    }

    pub fn must_new(registry: &Registry, opts: HistogramOpts) -> Self {
        let name = opts.common.fq_name();
        must(&name, Self::new(registry, opts))
    }

    pub fn fq_name(&self) -> &str {
        &self.inner.fq_name
    }

    pub fn label_names(&self) -> &[String] {
        self.inner.schema.names()
    }

    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.inner.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.children.is_empty()
    }

    pub fn get_metric_with_label_values(&self, values: &[&str]) -> Result<Arc<Histogram>> {
        self.inner
            .get_or_create(values, || Histogram::with_validated(&self.buckets))
    }

    pub fn with_label_values(&self, values: &[&str]) -> Arc<Histogram> {
        child_or_detached(
            &self.inner.fq_name,
            self.get_metric_with_label_values(values),
            || Histogram::with_validated(&self.buckets),
        )
    }

    /// NaN is rejected with `InvalidValue` after the arity check.
    pub fn try_observe(&self, value: f64, values: &[&str]) -> Result<()> {
        let child = self.get_metric_with_label_values(values)?;
        if value.is_nan() {
            return Err(MetricsError::InvalidValue {
                metric: self.inner.fq_name.clone(),
                value,
            });
        }
        child.observe(value);
        Ok(())
    }

    pub fn observe(&self, value: f64, values: &[&str]) {
        if let Err(e) = self.try_observe(value, values) {
            fail_write(&self.inner.fq_name, e);
        }
    }
}

impl Collector for HistogramVec {
    fn describe(&self) -> Vec<String> {
        vec![self.inner.fq_name.clone()]
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        Ok(vec![self
            .inner
            .family(MetricKind::Histogram, |h| MetricValue::Histogram(h.snapshot()))])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    fn registry() -> Registry {
        Registry::new(Identity::new("test", "localhost"))
    }

    fn counter_opts() -> Opts {
        Opts::new("hits_total", "hits")
            .namespace("t")
            .subsystem("vec")
            .labels(&["method", "type"])
    }

    #[test]
    fn inc_reuses_child_per_tuple() {
        let reg = registry();
        let v = CounterVec::new(&reg, counter_opts()).unwrap();
        for _ in 0..5 {
            v.inc(&["GET", "http"]);
        }
        v.inc(&["POST", "http"]);

        assert_eq!(v.len(), 2);
        assert_eq!(v.with_label_values(&["GET", "http"]).get(), 5);
        assert_eq!(v.with_label_values(&["POST", "http"]).get(), 1);
        assert!(Arc::ptr_eq(
            &v.with_label_values(&["GET", "http"]),
            &v.with_label_values(&["GET", "http"])
        ));
    }

    #[test]
    #[should_panic(expected = "inconsistent label cardinality")]
    fn inc_with_wrong_arity_panics() {
        let reg = registry();
        let v = CounterVec::new(&reg, counter_opts()).unwrap();
        v.inc(&["GET"]);
    }

    #[test]
    fn try_inc_reports_wrong_arity() {
        let reg = registry();
        let v = CounterVec::new(&reg, counter_opts()).unwrap();
        let err = v.try_inc(&["GET", "http", "extra"]).unwrap_err();
        assert!(matches!(err, MetricsError::InconsistentCardinality { expected: 2, got: 3 }));
        assert!(v.is_empty());
    }

    #[test]
    fn cardinality_cap_keeps_existing_children() {
        let reg = registry();
        let v = CounterVec::new(&reg, counter_opts().max_cardinality(1)).unwrap();
        v.try_inc(&["GET", "http"]).unwrap();
        let err = v.try_inc(&["PUT", "http"]).unwrap_err();
        assert!(matches!(err, MetricsError::CardinalityExceeded { limit: 1, .. }));
        v.try_inc(&["GET", "http"]).unwrap();
        assert_eq!(v.with_label_values(&["GET", "http"]).get(), 2);
        // the panicking API only logs on a cap hit
        v.inc(&["DELETE", "http"]);
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn with_label_values_past_the_cap_is_detached() {
        let reg = registry();
        let v = CounterVec::new(&reg, counter_opts().max_cardinality(1)).unwrap();
        v.with_label_values(&["GET", "http"]).inc();

        let detached = v.with_label_values(&["PUT", "http"]);
        detached.inc();
        assert_eq!(detached.get(), 1);
        assert_eq!(v.len(), 1);

        let fam = &v.collect().unwrap()[0];
        assert_eq!(fam.metrics.len(), 1);
        assert!(fam.find(&[("method", "PUT")]).is_none());

        let h = HistogramVec::new(
            &reg,
            HistogramOpts::new(Opts::new("lat_cap", "l").labels(&["method"]).max_cardinality(1)),
        )
        .unwrap();
        h.observe(1.0, &["GET"]);
        h.with_label_values(&["PUT"]).observe(3.0);
        assert_eq!(h.len(), 1);
    }

    #[test]
    #[should_panic(expected = "inconsistent label cardinality")]
    fn with_label_values_with_wrong_arity_panics() {
        let reg = registry();
        let v = HistogramVec::new(&reg, HistogramOpts::new(counter_opts())).unwrap();
        v.with_label_values(&["GET"]);
    }

    #[test]
    fn nan_observation_is_rejected_and_sum_survives() {
        let reg = registry();
        let v = HistogramVec::new(&reg, HistogramOpts::new(counter_opts())).unwrap();
        v.try_observe(4.0, &["GET", "http"]).unwrap();
        let err = v.try_observe(f64::NAN, &["GET", "http"]).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidValue { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::Observation);
        // the panicking twin logs and drops it
        v.observe(f64::NAN, &["GET", "http"]);

        let snap = v.with_label_values(&["GET", "http"]).snapshot();
        assert_eq!(snap.count, 1);
        assert_eq!(snap.sum, 4.0);
    }

    #[test]
    fn histogram_rejects_le_label_and_bad_buckets() {
        let reg = registry();
        let bad_label = HistogramOpts::new(Opts::new("lat", "l").labels(&["le"]));
        assert!(matches!(HistogramVec::new(&reg, bad_label), Err(MetricsError::InvalidName(_))));

        let bad_buckets = HistogramOpts::new(Opts::new("lat2", "l")).buckets(&[10.0, 5.0]);
        assert!(matches!(HistogramVec::new(&reg, bad_buckets), Err(MetricsError::InvalidBuckets(_))));
    }

    #[test]
    fn histogram_observe_uses_default_buckets() {
        let reg = registry();
        let v = HistogramVec::new(&reg, HistogramOpts::new(counter_opts())).unwrap();
        v.observe(12.0, &["GET", "http"]);
        let snap = v.with_label_values(&["GET", "http"]).snapshot();
        assert_eq!(snap.buckets[1], (10.0, 0));
        assert_eq!(snap.buckets[2], (25.0, 1));
        assert_eq!(snap.buckets[7], (1000.0, 1));
        assert_eq!(snap.count, 1);
    }

    #[test]
    fn concurrent_first_use_creates_one_child() {
        let reg = registry();
        let v = CounterVec::new(&reg, counter_opts()).unwrap();
        let threads: Vec<_> = (0..16)
            .map(|_| {
                let v = v.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        v.inc(&["GET", "http"]);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(v.len(), 1);
        assert_eq!(v.with_label_values(&["GET", "http"]).get(), 8000);
    }
}

//! Atomic metric cells: `Counter` and `Histogram`.
//!
//! Both are lock-free. A histogram keeps per-bucket (non-cumulative) counts
//! plus an overflow slot; the cumulative view and the total count are derived
//! at snapshot time, so a snapshot always satisfies
//! `bucket[i] <= bucket[i + 1] <= count`.
//!
//! `sum` is a separate cell and is not read together with the buckets: a
//! snapshot taken while an observation is in flight may count it in `count`
//! before its value reaches `sum`. The next snapshot is consistent again.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{MetricsError, Result};
use crate::family::HistogramSnapshot;

/// Default request-latency buckets, in milliseconds.
pub const DEFAULT_BUCKETS: [f64; 8] = [5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0];

/// Monotonic `u64` accumulator.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1.
    pub fn inc(&self) {
        self.inc_by(1);
    }

    /// Increment by an arbitrary amount.
    pub fn inc_by(&self, v: u64) {
        self.value.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Check that bounds are finite and strictly increasing.
pub fn validate_buckets(bounds: &[f64]) -> Result<()> {
    if bounds.is_empty() {
        return Err(MetricsError::InvalidBuckets("at least one bucket is required".into()));
    }
    for b in bounds {
        if !b.is_finite() {
            return Err(MetricsError::InvalidBuckets(format!("bucket bound {b} is not finite")));
        }
    }
    for w in bounds.windows(2) {
        if w[0] >= w[1] {
            return Err(MetricsError::InvalidBuckets(format!(
                "bounds must be strictly increasing ({} >= {})",
                w[0], w[1]
            )));
        }
    }
    Ok(())
}

#[derive(Debug)]
pub struct Histogram {
    bounds: Vec<f64>,
    // bounds.len() + 1 slots; the last one is the +Inf overflow.
    counts: Vec<AtomicU64>,
    sum_bits: AtomicU64,
}

impl Histogram {
    /// Build a histogram over validated bounds.
    pub fn new(bounds: &[f64]) -> Result<Self> {
        validate_buckets(bounds)?;
        Ok(Self::with_validated(bounds))
    }

    pub(crate) fn with_validated(bounds: &[f64]) -> Self {
        Self {
            bounds: bounds.to_vec(),
            counts: (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect(),
            sum_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Record `v`. NaN is ignored so it can never poison `sum`.
    pub fn observe(&self, v: f64) {
        if v.is_nan() {
            return;
        }
        // First bucket whose upper bound is >= v.
        let idx = self
            .bounds
            .iter()
            .position(|b| v <= *b)
            .unwrap_or(self.bounds.len());
        if let Some(slot) = self.counts.get(idx) {
            slot.fetch_add(1, Ordering::Relaxed);
        }

        let mut cur = self.sum_bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(cur) + v).to_bits();
            match self
                .sum_bits
                .compare_exchange_weak(cur, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => cur = actual,
            }
        }
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let mut cumulative = 0u64;
        let mut buckets = Vec::with_capacity(self.bounds.len());
        for (bound, slot) in self.bounds.iter().zip(&self.counts) {
            cumulative += slot.load(Ordering::Relaxed);
            buckets.push((*bound, cumulative));
        }
        let overflow = self
            .counts
            .last()
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0);

        HistogramSnapshot {
            buckets,
            sum: f64::from_bits(self.sum_bits.load(Ordering::Relaxed)),
            count: cumulative + overflow,
        }
    }
}

//! Sources of metric families.
//!
//! Vectors and ad-hoc collectors (process stats, runtime stats) implement the
//! same trait so the registry can treat them uniformly.

use crate::error::Result;
use crate::family::MetricFamily;

pub trait Collector: Send + Sync {
    /// Fully-qualified family names this collector may emit.
    /// Used for duplicate detection at registration time.
    fn describe(&self) -> Vec<String>;

    /// Snapshot current state. Must not mutate anything observable.
    fn collect(&self) -> Result<Vec<MetricFamily>>;
}

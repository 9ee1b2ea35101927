//! reqmetrics core: label-parameterized metric vectors, the registry, and the
//! text exposition encoder.
//!
//! This crate carries no transport or runtime dependencies. Interceptors,
//! builtin collectors and HTTP wiring live in `reqmetrics-middleware`.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! The only exceptions are the documented fatal entry points (`must_new`,
//! `must_register`, and arity mismatches on `inc` / `observe` /
//! `with_label_values`), which signal schema bugs at startup. Every such call has a
//! `Result`-returning twin.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod collector;
pub mod encoder;
pub mod error;
pub mod family;
pub mod identity;
pub mod labels;
pub mod metric;
pub mod registry;
pub mod vec;

/// Shared result type.
pub use error::{ErrorKind, MetricsError, Result};

pub use collector::Collector;
pub use family::{HistogramSnapshot, Metric, MetricFamily, MetricKind, MetricValue};
pub use identity::Identity;
pub use labels::LabelPair;
pub use metric::{Counter, Histogram, DEFAULT_BUCKETS};
pub use registry::Registry;
pub use vec::{CounterVec, HistogramOpts, HistogramVec, Opts};

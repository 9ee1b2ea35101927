//! Shared error type across reqmetrics crates.

use thiserror::Error;

/// Error taxonomy (stable API).
///
/// Configuration errors are fatal at startup, observation errors are dropped
/// on the request path, export errors fail a single scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inconsistent metric schema or bad options.
    Configuration,
    /// A single observation could not be recorded.
    Observation,
    /// A gather/scrape could not be produced.
    Export,
}

impl ErrorKind {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "CONFIGURATION",
            ErrorKind::Observation => "OBSERVATION",
            ErrorKind::Export => "EXPORT",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and middleware.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric already registered: {0}")]
    AlreadyRegistered(String),
    #[error("inconsistent label cardinality: expected {expected} values, got {got}")]
    InconsistentCardinality { expected: usize, got: usize },
    #[error("cardinality limit {limit} reached for {metric}")]
    CardinalityExceeded { metric: String, limit: usize },
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid observation for {metric}: {value}")]
    InvalidValue { metric: String, value: f64 },
    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),
    #[error("collect failed: {0}")]
    Collect(String),
    #[error("config: {0}")]
    Config(String),
}

impl MetricsError {
    /// Map an error onto its taxonomy bucket.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetricsError::AlreadyRegistered(_)
            | MetricsError::InvalidName(_)
            | MetricsError::InvalidBuckets(_)
            | MetricsError::InconsistentCardinality { .. }
            | MetricsError::Config(_) => ErrorKind::Configuration,
            MetricsError::CardinalityExceeded { .. } | MetricsError::InvalidValue { .. } => {
                ErrorKind::Observation
            }
            MetricsError::Collect(_) => ErrorKind::Export,
        }
    }
}

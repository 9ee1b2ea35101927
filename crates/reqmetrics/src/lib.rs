//! Top-level facade crate for reqmetrics.
//!
//! Re-exports the metric core and the request middleware so users can depend on a single crate.

pub mod core {
    pub use reqmetrics_core::*;
}

pub mod middleware {
    pub use reqmetrics_middleware::*;
}

pub use reqmetrics_core::{Registry, Identity};
pub use reqmetrics_middleware::obs::RequestMetrics;

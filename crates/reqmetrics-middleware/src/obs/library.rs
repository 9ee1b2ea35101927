//! Client-library call counter (databases, caches).
//!
//! `<ns>_database_lib_handle_total{type, method, name, server}` where `type`
//! is the library kind (`mysql`, `redis`, ...), `name` the logical database
//! and `server` its address.

use reqmetrics_core::error::Result;
use reqmetrics_core::{CounterVec, Opts, Registry};

#[derive(Clone)]
pub struct LibraryMetrics {
    pub lib_handle_counter: CounterVec,
}

impl LibraryMetrics {
    pub fn new(registry: &Registry, namespace: &str) -> Result<Self> {
        Ok(Self {
            lib_handle_counter: CounterVec::new(
                registry,
                Opts::new("lib_handle_total", "database situation")
                    .namespace(namespace)
                    .subsystem("database")
                    .labels(&["type", "method", "name", "server"]),
            )?,
        })
    }

    pub fn record(&self, kind: &str, method: &str, name: &str, server: &str) {
        if let Err(e) = self.lib_handle_counter.try_inc(&[kind, method, name, server]) {
            tracing::warn!(%kind, %method, error = %e, "library call count dropped");
        }
    }
}

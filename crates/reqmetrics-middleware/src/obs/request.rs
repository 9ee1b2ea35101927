//! Standard request vectors shared by every interceptor.
//!
//! Label meanings:
//! - `method`: transport method + route (`GET->/product/:id`) or full RPC method
//! - `type`: `http` | `grpc`
//! - `status`: status code as a string (histograms only)
//! - `peer` / `peer_host`: calling service name / address, may be empty
//! - `server`: target address of an outgoing call

use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use reqmetrics_core::error::Result;
use reqmetrics_core::identity::DEFAULT_APP;
use reqmetrics_core::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};

pub const TYPE_HTTP: &str = "http";
pub const TYPE_GRPC: &str = "grpc";

const SUBSYSTEM: &str = "request";

static GLOBAL: OnceLock<RequestMetrics> = OnceLock::new();
// Serialises registration so the global vectors are registered exactly once.
static GLOBAL_INIT: Mutex<()> = Mutex::new(());

/// Server- and client-side latency histograms and counters.
#[derive(Clone)]
pub struct RequestMetrics {
    pub server_handle_histogram: HistogramVec,
    pub server_handle_counter: CounterVec,
    pub client_handle_histogram: HistogramVec,
    pub client_handle_counter: CounterVec,
}

impl RequestMetrics {
    pub fn new(registry: &Registry, namespace: &str) -> Result<Self> {
        Self::with_cardinality_limit(registry, namespace, None)
    }

    /// Build and register the four vectors; `limit` caps each vector's label tuples.
    pub fn with_cardinality_limit(registry: &Registry, namespace: &str, limit: Option<usize>) -> Result<Self> {
        let opts = |name: &str, help: &str, labels: &[&str]| {
            let mut o = Opts::new(name, help)
                .namespace(namespace)
                .subsystem(SUBSYSTEM)
                .labels(labels);
            o.max_cardinality = limit;
            o
        };

        Ok(Self {
            server_handle_histogram: HistogramVec::new(
                registry,
                HistogramOpts::new(opts(
                    "server_handle_seconds",
                    "server handle seconds.",
                    &["method", "type", "status", "peer", "peer_host"],
                )),
            )?,
            server_handle_counter: CounterVec::new(
                registry,
                opts(
                    "server_handle_total",
                    "server handle total.",
                    &["method", "type", "peer", "peer_host"],
                ),
            )?,
            client_handle_histogram: HistogramVec::new(
                registry,
                HistogramOpts::new(opts(
                    "client_handle_seconds",
                    "client handle seconds.",
                    &["method", "type", "server"],
                )),
            )?,
            client_handle_counter: CounterVec::new(
                registry,
                opts(
                    "client_handle_total",
                    "client handle total.",
                    &["method", "type", "server"],
                ),
            )?,
        })
    }

    /// Install the process-wide vectors into `Registry::global()`.
    ///
    /// The first call registers them under `namespace` with `limit`; later
    /// calls return the installed set unchanged. HTTP and RPC interceptors
    /// built from the global paths all record into this one set.
    pub fn init_global(namespace: &str, limit: Option<usize>) -> Result<&'static RequestMetrics> {
        if let Some(m) = GLOBAL.get() {
            return Ok(m);
        }
        let _guard = GLOBAL_INIT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(m) = GLOBAL.get() {
            return Ok(m);
        }
        let m = Self::with_cardinality_limit(Registry::global(), namespace, limit)?;
        tracing::info!(%namespace, "global request metrics registered");
        Ok(GLOBAL.get_or_init(|| m))
    }

    /// The process-wide vectors, installed under the default namespace if
    /// `init_global` has not run yet.
    #[allow(clippy::panic)]
    pub fn global() -> &'static RequestMetrics {
        match Self::init_global(DEFAULT_APP, None) {
            Ok(m) => m,
            Err(e) => panic!("request metrics registration failed: {e}"),
        }
    }

    /// Record one completed inbound request. Failures are logged, never returned.
    pub fn record_server(
        &self,
        method: &str,
        kind: &str,
        status: &str,
        peer: &str,
        peer_host: &str,
        elapsed: Duration,
    ) {
        let ms = millis(elapsed);
        if let Err(e) = self
            .server_handle_histogram
            .try_observe(ms, &[method, kind, status, peer, peer_host])
        {
            tracing::warn!(%method, error = %e, "server latency observation dropped");
        }
        if let Err(e) = self
            .server_handle_counter
            .try_inc(&[method, kind, peer, peer_host])
        {
            tracing::warn!(%method, error = %e, "server request count dropped");
        }
    }

    /// Record one completed outbound call. Failures are logged, never returned.
    pub fn record_client(&self, method: &str, kind: &str, server: &str, elapsed: Duration) {
        let ms = millis(elapsed);
        if let Err(e) = self
            .client_handle_histogram
            .try_observe(ms, &[method, kind, server])
        {
            tracing::warn!(%method, %server, error = %e, "client latency observation dropped");
        }
        if let Err(e) = self.client_handle_counter.try_inc(&[method, kind, server]) {
            tracing::warn!(%method, %server, error = %e, "client call count dropped");
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

//! Shared application state for the instrumented server.
//!
//! Wires the registry, builtin collectors, request vectors and HTTP monitor
//! from one validated config. Startup errors are returned, not panicked.

use std::sync::Arc;

use reqmetrics_core::error::Result;
use reqmetrics_core::Registry;

use crate::config::MetricsConfig;
use crate::http::{HttpMonitor, MonitorConfig};
use crate::obs::{register_builtins, BuiltinOptions, LibraryMetrics, RequestMetrics};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: MetricsConfig,
    registry: Registry,
    request: RequestMetrics,
    library: LibraryMetrics,
    monitor: HttpMonitor,
}

impl AppState {
    /// Build state against an explicit registry.
    pub fn new(cfg: MetricsConfig, registry: Registry) -> Result<Self> {
        let r = &cfg.registry;
        let request = RequestMetrics::with_cardinality_limit(&registry, &r.namespace, r.max_cardinality)?;
        Self::assemble(cfg, registry, request)
    }

    /// Build state against the process-wide registry, seeded from config identity.
    ///
    /// Request vectors come from `RequestMetrics::init_global`, so RPC
    /// interceptors built with `::global()` share them with the HTTP monitor.
    pub fn with_global_registry(cfg: MetricsConfig) -> Result<Self> {
        let registry = Registry::init_global(cfg.identity.resolve()).clone();
        let request =
            RequestMetrics::init_global(&cfg.registry.namespace, cfg.registry.max_cardinality)?.clone();
        Self::assemble(cfg, registry, request)
    }

    fn assemble(cfg: MetricsConfig, registry: Registry, request: RequestMetrics) -> Result<Self> {
        let r = &cfg.registry;

        // 1) builtin collectors
        register_builtins(&registry, BuiltinOptions::from(r))?;

        // 2) library vectors
        let library = LibraryMetrics::new(&registry, &r.namespace)?;

        // 3) http monitor
        let monitor = HttpMonitor::new(
            registry.clone(),
            request.clone(),
            MonitorConfig::from(&cfg.http),
        )?;

        tracing::info!(
            app = %registry.identity().app,
            host = %registry.identity().host,
            namespace = %r.namespace,
            runtime = r.enable_runtime_metrics,
            process = r.enable_process_metrics,
            "metrics state ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                request,
                library,
                monitor,
            }),
        })
    }

    pub fn cfg(&self) -> &MetricsConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn request_metrics(&self) -> &RequestMetrics {
        &self.inner.request
    }

    pub fn library_metrics(&self) -> &LibraryMetrics {
        &self.inner.library
    }

    pub fn monitor(&self) -> &HttpMonitor {
        &self.inner.monitor
    }
}

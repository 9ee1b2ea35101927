//! HTTP request monitor (axum middleware).
//!
//! Responsibilities:
//! - Skip the scrape path and configured exclusions (no self-measurement)
//! - Time the downstream handler inline, then record exactly once
//! - Label with the matched route template, never the raw path
//! - Serve the registry at the scrape path
//!
//! `Router::layer` only wraps routes added before it, so attach the monitor
//! after all application routes are defined.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::time::Instant;

use reqmetrics_core::error::{MetricsError, Result};
use reqmetrics_core::Registry;

use crate::config::HttpSection;
use crate::obs::{RequestMetrics, TYPE_HTTP};
use crate::ops;

pub const DEFAULT_METRIC_PATH: &str = "/debug/metrics";

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Scrape route; never instrumented.
    pub metric_path: String,
    /// Exact paths passed through without instrumentation (e.g. `/healthz`).
    pub exclude_paths: Vec<String>,
    /// Name of the instrumented server, for logs.
    pub server_name: String,
    /// Free-form key/values describing the server, logged when attached.
    pub metadata: BTreeMap<String, String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            metric_path: DEFAULT_METRIC_PATH.to_string(),
            exclude_paths: Vec::new(),
            server_name: String::new(),
            metadata: BTreeMap::new(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.metric_path.starts_with('/') {
            return Err(MetricsError::Config("metric_path must start with '/'".into()));
        }
        if let Some(p) = self.exclude_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(MetricsError::Config(format!("exclude path must start with '/': {p}")));
        }
        Ok(())
    }
}

impl From<&HttpSection> for MonitorConfig {
    fn from(h: &HttpSection) -> Self {
        Self {
            metric_path: h.metric_path.clone(),
            exclude_paths: h.exclude_paths.clone(),
            server_name: h.server_name.clone(),
            metadata: h.metadata.clone(),
        }
    }
}

#[derive(Clone)]
pub struct HttpMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    cfg: MonitorConfig,
    registry: Registry,
    metrics: RequestMetrics,
}

impl HttpMonitor {
    pub fn new(registry: Registry, metrics: RequestMetrics, cfg: MonitorConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            inner: Arc::new(MonitorInner {
                cfg,
                registry,
                metrics,
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> &RequestMetrics {
        &self.inner.metrics
    }

    fn is_excluded(&self, path: &str) -> bool {
        let cfg = &self.inner.cfg;
        path == cfg.metric_path || cfg.exclude_paths.iter().any(|p| p == path)
    }

    /// Add the scrape route and instrument every route defined so far.
    pub fn attach<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.attach_without_endpoint(self.expose(router))
    }

    /// Instrument routes without serving the scrape path here. Pair with
    /// `expose` on another router to serve metrics on a separate listener.
    pub fn attach_without_endpoint<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        tracing::info!(
            server = %self.inner.cfg.server_name,
            metadata = ?self.inner.cfg.metadata,
            excluded = ?self.inner.cfg.exclude_paths,
            "http monitor attached"
        );
        router.layer(middleware::from_fn_with_state(self.clone(), track))
    }

    /// Serve the registry at the configured path.
    pub fn expose<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let registry = self.inner.registry.clone();
        router.route(
            &self.inner.cfg.metric_path,
            get(move || {
                let registry = registry.clone();
                async move { ops::scrape(&registry) }
            }),
        )
    }
}

async fn track(State(monitor): State<HttpMonitor>, req: Request, next: Next) -> Response {
    if monitor.is_excluded(req.uri().path()) {
        return next.run(req).await;
    }

    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_default();
    let method = format!("{}->{}", req.method(), route);

    let start = Instant::now();
    let resp = next.run(req).await;

    monitor.inner.metrics.record_server(
        &method,
        TYPE_HTTP,
        resp.status().as_str(),
        "",
        "",
        start.elapsed(),
    );
    resp
}

//! Builtin resource collectors (runtime + process).
//!
//! Call `register_builtins` at most once per registry: every collector's
//! names are checked up front, so a second call fails with
//! `AlreadyRegistered` and registers nothing.

use std::sync::Arc;

use reqmetrics_core::error::{MetricsError, Result};
use reqmetrics_core::identity::DEFAULT_APP;
use reqmetrics_core::{Collector, Registry};

use super::process::{PidFn, ProcessCollector};
use super::runtime::RuntimeCollector;
use crate::config::RegistrySection;

#[derive(Clone)]
pub struct BuiltinOptions {
    pub include_runtime_metrics: bool,
    pub include_process_metrics: bool,
    /// Defaults to the current process.
    pub pid_resolver: Option<PidFn>,
    /// Prefix of the process families.
    pub namespace: String,
    pub report_errors: bool,
    /// Caller-supplied collectors registered alongside the builtins.
    pub extra_collectors: Vec<Arc<dyn Collector>>,
}

impl Default for BuiltinOptions {
    fn default() -> Self {
        Self {
            include_runtime_metrics: false,
            include_process_metrics: false,
            pid_resolver: None,
            namespace: DEFAULT_APP.to_string(),
            report_errors: false,
            extra_collectors: Vec::new(),
        }
    }
}

impl From<&RegistrySection> for BuiltinOptions {
    fn from(r: &RegistrySection) -> Self {
        Self {
            include_runtime_metrics: r.enable_runtime_metrics,
            include_process_metrics: r.enable_process_metrics,
            namespace: r.process_namespace.clone(),
            report_errors: r.report_errors,
            ..Self::default()
        }
    }
}

pub fn register_builtins(registry: &Registry, opts: BuiltinOptions) -> Result<()> {
    let mut collectors = opts.extra_collectors;

    if opts.include_runtime_metrics {
        collectors.push(Arc::new(RuntimeCollector::new()));
    }
    if opts.include_process_metrics {
        collectors.push(Arc::new(ProcessCollector::new(
            opts.namespace,
            opts.pid_resolver,
            opts.report_errors,
        )));
    }

    let mut seen = Vec::new();
    for c in &collectors {
        for name in c.describe() {
            if registry.is_registered(&name) || seen.contains(&name) {
                return Err(MetricsError::AlreadyRegistered(name));
            }
            seen.push(name);
        }
    }

    for c in collectors {
        registry.register(c)?;
    }
    tracing::info!(families = seen.len(), "builtin metrics registered");
    Ok(())
}

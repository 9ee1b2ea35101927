use std::collections::BTreeMap;
use std::net::SocketAddr;

use serde::Deserialize;
use reqmetrics_core::error::{MetricsError, Result};
use reqmetrics_core::identity::{self, Identity};
use reqmetrics_core::labels::validate_metric_name;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    pub version: u32,

    #[serde(default)]
    pub identity: IdentitySection,

    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default)]
    pub http: HttpSection,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            identity: IdentitySection::default(),
            registry: RegistrySection::default(),
            http: HttpSection::default(),
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.registry.validate()?;
        self.http.validate()?;

        Ok(())
    }
}

/// Overrides for the identity labels; unset fields come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentitySection {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
}

impl IdentitySection {
    pub fn resolve(&self) -> Identity {
        let env = Identity::from_env();
        Identity {
            app: self.app.clone().unwrap_or(env.app),
            host: self.host.clone().unwrap_or(env.host),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    /// Namespace of the request vectors.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub enable_runtime_metrics: bool,

    #[serde(default)]
    pub enable_process_metrics: bool,

    #[serde(default = "default_namespace")]
    pub process_namespace: String,

    /// Fail the scrape instead of skipping when process stats cannot be read.
    #[serde(default)]
    pub report_errors: bool,

    /// Per-vector cap on label tuples. Unbounded when absent.
    #[serde(default)]
    pub max_cardinality: Option<usize>,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            enable_runtime_metrics: false,
            enable_process_metrics: false,
            process_namespace: default_namespace(),
            report_errors: false,
            max_cardinality: None,
        }
    }
}

impl RegistrySection {
    pub fn validate(&self) -> Result<()> {
        for (field, ns) in [("namespace", &self.namespace), ("process_namespace", &self.process_namespace)] {
            if !ns.is_empty() {
                validate_metric_name(ns)
                    .map_err(|e| MetricsError::Config(format!("registry.{field}: {e}")))?;
            }
        }
        if self.max_cardinality == Some(0) {
            return Err(MetricsError::Config(
                "registry.max_cardinality must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_metric_path")]
    pub metric_path: String,

    #[serde(default)]
    pub exclude_paths: Vec<String>,

    #[serde(default)]
    pub server_name: String,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metric_path: default_metric_path(),
            exclude_paths: Vec::new(),
            server_name: String::new(),
            metadata: BTreeMap::new(),
        }
    }
}

impl HttpSection {
    pub fn validate(&self) -> Result<()> {
        self.listen
            .parse::<SocketAddr>()
            .map_err(|e| MetricsError::Config(format!("http.listen must be a valid SocketAddr: {e}")))?;

        if !self.metric_path.starts_with('/') {
            return Err(MetricsError::Config("http.metric_path must start with '/'".into()));
        }
        if let Some(p) = self.exclude_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(MetricsError::Config(format!(
                "http.exclude_paths entry must start with '/': {p}"
            )));
        }
        Ok(())
    }
}

fn default_namespace() -> String {
    identity::DEFAULT_APP.into()
}
fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_metric_path() -> String {
    "/debug/metrics".into()
}

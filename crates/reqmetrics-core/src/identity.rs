//! Process identity labels (`app`, `host`).
//!
//! Computed once when a registry is built and appended to every exported
//! sample at gather time. They are never part of a vector's key space.

use std::fs;

use crate::labels::LabelPair;

/// Environment variable naming the application.
pub const APP_ENV: &str = "REQMETRICS_APP";
pub const DEFAULT_APP: &str = "gfast";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub app: String,
    pub host: String,
}

impl Identity {
    pub fn new(app: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            host: host.into(),
        }
    }

    /// Resolve from `REQMETRICS_APP` and the host name (`HOSTNAME`, then
    /// `/etc/hostname`). Missing values fall back to defaults.
    pub fn from_env() -> Self {
        let app = non_empty(std::env::var(APP_ENV).ok()).unwrap_or_else(|| DEFAULT_APP.to_string());
        Self { app, host: hostname() }
    }

    pub fn label_pairs(&self) -> Vec<LabelPair> {
        vec![
            LabelPair::new("app", self.app.clone()),
            LabelPair::new("host", self.host.clone()),
        ]
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn hostname() -> String {
    non_empty(std::env::var("HOSTNAME").ok())
        .or_else(|| non_empty(fs::read_to_string("/etc/hostname").ok()))
        .unwrap_or_else(|| "unknown".to_string())
}

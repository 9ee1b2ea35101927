//! HTTP surface: request monitor middleware and scrape route.

pub mod monitor;

pub use monitor::{HttpMonitor, MonitorConfig, DEFAULT_METRIC_PATH};

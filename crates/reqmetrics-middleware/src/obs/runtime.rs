//! Tokio runtime collector.
//!
//! Captures the runtime handle current at construction and reports
//! `tokio_workers`, `tokio_alive_tasks` and `tokio_global_queue_depth`. Built
//! outside a runtime it reports nothing.

use tokio::runtime::Handle;

use reqmetrics_core::error::Result;
use reqmetrics_core::{Collector, MetricFamily, MetricKind};

const WORKERS: &str = "tokio_workers";
const ALIVE_TASKS: &str = "tokio_alive_tasks";
const GLOBAL_QUEUE_DEPTH: &str = "tokio_global_queue_depth";

pub struct RuntimeCollector {
    handle: Option<Handle>,
}

impl RuntimeCollector {
    pub fn new() -> Self {
        let handle = Handle::try_current().ok();
        if handle.is_none() {
            tracing::warn!("runtime collector built outside a tokio runtime, it will report nothing");
        }
        Self { handle }
    }

    pub fn for_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl Default for RuntimeCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for RuntimeCollector {
    fn describe(&self) -> Vec<String> {
        [WORKERS, ALIVE_TASKS, GLOBAL_QUEUE_DEPTH]
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let Some(handle) = &self.handle else {
            return Ok(Vec::new());
        };
        let m = handle.metrics();
        Ok(vec![
            MetricFamily::single(
                WORKERS,
                "Number of worker threads used by the runtime.",
                MetricKind::Gauge,
                m.num_workers() as f64,
            ),
            MetricFamily::single(
                ALIVE_TASKS,
                "Number of tasks currently alive in the runtime.",
                MetricKind::Gauge,
                m.num_alive_tasks() as f64,
            ),
            MetricFamily::single(
                GLOBAL_QUEUE_DEPTH,
                "Number of tasks waiting in the runtime's global queue.",
                MetricKind::Gauge,
                m.global_queue_depth() as f64,
            ),
        ])
    }
}

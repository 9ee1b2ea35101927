//! Metric registry with identity-label injection.
//!
//! The registry owns every registered collector and a fixed list of identity
//! label pairs. `gather` snapshots all collectors, then appends the identity
//! pairs to each sample. Injection happens on the snapshot only, so live
//! counters and histograms are never touched.
//!
//! `Registry` is a cheap handle (`Arc` inside). Pass it explicitly to vector
//! constructors and interceptors; `Registry::global()` exists for wiring code
//! that wants one process-wide instance.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock, RwLock};

use crate::collector::Collector;
use crate::encoder;
use crate::error::{MetricsError, Result};
use crate::family::MetricFamily;
use crate::identity::Identity;
use crate::labels::LabelPair;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    identity: Identity,
    identity_labels: Vec<LabelPair>,
    state: RwLock<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    collectors: Vec<Arc<dyn Collector>>,
    names: HashSet<String>,
}

impl Registry {
    pub fn new(identity: Identity) -> Self {
        let identity_labels = identity.label_pairs();
        Self {
            inner: Arc::new(RegistryInner {
                identity,
                identity_labels,
                state: RwLock::new(RegistryState::default()),
            }),
        }
    }

    /// Process-wide registry, built on first access from `Identity::from_env`.
    /// Concurrent first callers race on a `OnceLock`; exactly one build wins.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(|| {
            let identity = Identity::from_env();
            tracing::info!(app = %identity.app, host = %identity.host, "global metrics registry initialized");
            Registry::new(identity)
        })
    }

    /// Install `identity` as the global registry's identity.
    /// Returns the already-built registry untouched if it exists.
    pub fn init_global(identity: Identity) -> &'static Registry {
        GLOBAL.get_or_init(|| Registry::new(identity))
    }

    pub fn ptr_eq(a: &Registry, b: &Registry) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    pub fn identity_labels(&self) -> &[LabelPair] {
        &self.inner.identity_labels
    }

    /// Register a collector. All of its names are checked before anything is
    /// inserted, so a failed registration leaves the registry unchanged.
    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<()> {
        let names = collector.describe();
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut fresh: HashSet<&str> = HashSet::with_capacity(names.len());
        for n in &names {
            if state.names.contains(n) || !fresh.insert(n.as_str()) {
                return Err(MetricsError::AlreadyRegistered(n.clone()));
            }
        }

        for n in &names {
            state.names.insert(n.clone());
        }
        state.collectors.push(collector);
        tracing::debug!(names = ?names, "collector registered");
        Ok(())
    }

    /// Register every collector or abort on the first duplicate.
    #[allow(clippy::panic)]
    pub fn must_register(&self, collectors: impl IntoIterator<Item = Arc<dyn Collector>>) {
        for c in collectors {
            if let Err(e) = self.register(c) {
                panic!("metrics registration failed: {e}");
            }
        }
    }

    pub fn is_registered(&self, fq_name: &str) -> bool {
        self.inner
            .state
            .read()
            .map(|s| s.names.contains(fq_name))
            .unwrap_or(false)
    }

    /// Snapshot every collector and inject identity labels.
    ///
    /// Families come back sorted by name, samples sorted by labels. Any
    /// collector failure fails the whole gather.
    pub fn gather(&self) -> Result<Vec<MetricFamily>> {
        // Clone the handles so collectors run without holding the registry lock.
        let collectors: Vec<Arc<dyn Collector>> = {
            let state = self
                .inner
                .state
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state.collectors.clone()
        };

        let mut families = Vec::new();
        for c in &collectors {
            families.extend(c.collect()?);
        }

        families.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(w) = families.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(MetricsError::Collect(format!(
                "family {} emitted by more than one collector",
                w[0].name
            )));
        }

        for fam in &mut families {
            fam.metrics.sort_by(|a, b| a.labels.cmp(&b.labels));
            for m in &mut fam.metrics {
                for pair in &self.inner.identity_labels {
                    // A sample that already carries the name keeps its own value.
                    if m.labels.iter().all(|l| l.name != pair.name) {
                        m.labels.push(pair.clone());
                    }
                }
            }
        }

        Ok(families)
    }

    /// Gather and render in the text exposition format.
    pub fn encode_text(&self) -> Result<String> {
        Ok(encoder::encode_text(&self.gather()?))
    }
}

//! Feature to collector binding, resolved once at startup

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{
    BgpCollector, Collector, EnvironmentCollector, FactsCollector, InterfacesCollector,
    NeighborsCollector, OpticsCollector,
};
use crate::metrics::MetricDesc;
use crate::models::{Feature, Target};

/// Builds the collector for a feature
#[must_use]
pub fn build_collector(feature: Feature) -> Arc<dyn Collector> {
    match feature {
        Feature::Bgp => Arc::new(BgpCollector::new()),
        Feature::Environment => Arc::new(EnvironmentCollector::new()),
        Feature::Facts => Arc::new(FactsCollector::new()),
        Feature::Interfaces => Arc::new(InterfacesCollector::new()),
        Feature::Optics => Arc::new(OpticsCollector::new()),
        Feature::Neighbors => Arc::new(NeighborsCollector::new()),
    }
}

/// Shared collector instances and the ordered list each target runs
///
/// Read-only once built. Every target enabling a feature gets a clone of
/// the same `Arc`.
#[derive(Default)]
pub struct CollectorRegistry {
    shared: BTreeMap<Feature, Arc<dyn Collector>>,
    by_target: HashMap<String, Vec<Arc<dyn Collector>>>,
}

impl CollectorRegistry {
    /// Builds the registry with the stock collectors
    #[must_use]
    pub fn for_targets(targets: &[Target]) -> Self {
        Self::with_factory(targets, build_collector)
    }

    /// Builds the registry with a custom constructor
    ///
    /// `factory` is called at most once per feature.
    pub fn with_factory(targets: &[Target], factory: impl Fn(Feature) -> Arc<dyn Collector>) -> Self {
        let mut registry = Self::default();
        for target in targets {
            let collectors = target
                .features
                .iter()
                .map(|feature| {
                    Arc::clone(
                        registry
                            .shared
                            .entry(feature)
                            .or_insert_with(|| factory(feature)),
                    )
                })
                .collect();
            registry.by_target.insert(target.identity(), collectors);
        }
        tracing::debug!(
            targets = registry.by_target.len(),
            collectors = registry.shared.len(),
            "Collector registry built"
        );
        registry
    }

    /// Collectors for `target` in execution order; empty for unknown targets
    #[must_use]
    pub fn collectors_for(&self, target: &Target) -> &[Arc<dyn Collector>] {
        self.by_target
            .get(&target.identity())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Instance for a feature, if any target enabled it
    #[must_use]
    pub fn get(&self, feature: Feature) -> Option<&Arc<dyn Collector>> {
        self.shared.get(&feature)
    }

    /// Every shared instance in feature order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Collector>> {
        self.shared.values()
    }

    /// Descriptors of every instantiated collector
    #[must_use]
    pub fn describe(&self) -> Vec<Arc<MetricDesc>> {
        self.shared.values().flat_map(|c| c.describe()).collect()
    }

    /// Number of instantiated collectors
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// True when no target enabled any feature
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.is_empty()
    }
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("features", &self.shared.keys().collect::<Vec<_>>())
            .field("targets", &self.by_target.len())
            .finish()
    }
}

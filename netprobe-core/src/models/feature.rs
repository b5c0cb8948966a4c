//! Metric families that can be toggled per device

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One metric family and the collector that produces it
///
/// Declaration order is the order collectors run on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    /// BGP session state and counters
    Bgp,
    /// Temperature sensors and power supplies
    Environment,
    /// Version, memory and CPU
    Facts,
    /// Interface status and counters
    Interfaces,
    /// Transceiver power levels
    Optics,
    /// ARP and IPv6 neighbor counts per interface
    Neighbors,
}

impl Feature {
    /// All features in execution order
    pub const ALL: [Self; 6] = [
        Self::Bgp,
        Self::Environment,
        Self::Facts,
        Self::Interfaces,
        Self::Optics,
        Self::Neighbors,
    ];

    /// Configuration key of this feature
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Bgp => "bgp",
            Self::Environment => "environment",
            Self::Facts => "facts",
            Self::Interfaces => "interfaces",
            Self::Optics => "optics",
            Self::Neighbors => "neighbors",
        }
    }

    /// Whether the feature is on when nothing is configured
    ///
    /// Neighbor tables can be large on aggregation switches, so that family
    /// is opt-in.
    #[must_use]
    pub const fn enabled_by_default(self) -> bool {
        !matches!(self, Self::Neighbors)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown feature: {s}"))
    }
}

/// Resolved set of enabled features for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeatureSet {
    bits: u8,
}

impl FeatureSet {
    /// Creates an empty set
    #[must_use]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// The set of features that are on without configuration
    #[must_use]
    pub fn defaults() -> Self {
        Feature::ALL
            .into_iter()
            .filter(|feature| feature.enabled_by_default())
            .collect()
    }

    const fn bit(feature: Feature) -> u8 {
        1 << feature as u8
    }

    /// Enables or disables a feature
    pub const fn set(&mut self, feature: Feature, enabled: bool) {
        if enabled {
            self.bits |= Self::bit(feature);
        } else {
            self.bits &= !Self::bit(feature);
        }
    }

    /// Returns a copy with the feature toggled
    #[must_use]
    pub const fn with(mut self, feature: Feature, enabled: bool) -> Self {
        self.set(feature, enabled);
        self
    }

    /// Checks whether a feature is enabled
    #[must_use]
    pub const fn contains(self, feature: Feature) -> bool {
        self.bits & Self::bit(feature) != 0
    }

    /// Enabled features in execution order
    pub fn iter(self) -> impl Iterator<Item = Feature> {
        Feature::ALL
            .into_iter()
            .filter(move |feature| self.contains(*feature))
    }

    /// Returns true if no feature is enabled
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        let mut set = Self::empty();
        for feature in iter {
            set.set(feature, true);
        }
        set
    }
}

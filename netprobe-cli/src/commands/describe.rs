//! Descriptor listing command.

use netprobe_core::{Config, FeatureSet, Orchestrator};

use crate::error::CliError;

/// Features enabled on any configured device, or the global set without devices
pub fn enabled_features(config: &Config) -> FeatureSet {
    if config.devices.is_empty() {
        return config.features.resolve(None);
    }
    config
        .devices
        .iter()
        .flat_map(|device| config.features_for(device).iter())
        .collect()
}

/// Print every descriptor the enabled collectors expose
pub fn cmd_describe(config: &Config) -> Result<(), CliError> {
    for desc in Orchestrator::describe_features(enabled_features(config)) {
        println!(
            "{}{{{}}}\t{}",
            desc.name(),
            desc.label_names().join(","),
            desc.help()
        );
    }
    Ok(())
}

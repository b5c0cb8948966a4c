//! Configuration validation command.

use netprobe_core::{Config, Feature};

use crate::error::CliError;

/// Validate the configuration, load keys and list resolved targets
pub fn cmd_check(config: &Config) -> Result<(), CliError> {
    let targets = config.resolve_targets()?;

    for target in &targets {
        let features: Vec<&str> = target.features.iter().map(Feature::key).collect();
        println!(
            "{}\t{}@{}\ttimeout={}s\tbatch={}\t{}{}",
            target.identity(),
            target.auth.username(),
            target.auth.kind(),
            target.timeout.as_secs(),
            target.batch_size,
            features.join(","),
            if target.legacy_ciphers { "\tlegacy-ciphers" } else { "" },
        );
    }
    println!("Configuration OK: {} target(s)", targets.len());
    Ok(())
}

//! Shared utility functions used across command modules.

use std::path::Path;

use netprobe_core::Config;

use crate::cli::TargetArgs;
use crate::error::CliError;

/// Loads the configuration and applies command-line overrides
///
/// An explicit `--config` must exist. Without one the default location is
/// read when present, unless `--targets` supplies the device list.
pub fn load_config(
    config_path: Option<&Path>,
    debug: bool,
    args: &TargetArgs,
) -> Result<Config, CliError> {
    let mut config = match config_path {
        Some(path) => Config::load(path)?,
        None => match Config::default_path().filter(|p| p.is_file()) {
            Some(path) if args.targets.is_none() => Config::load(&path)?,
            _ => Config::default(),
        },
    };
    apply_overrides(&mut config, args);
    config.debug |= debug;
    Ok(config)
}

fn apply_overrides(config: &mut Config, args: &TargetArgs) {
    if let Some(targets) = &args.targets {
        config.devices.clear();
        *config = std::mem::take(config).with_targets(targets);
    }
    if let Some(user) = &args.user {
        config.username.clone_from(user);
    }
    if args.password.is_some() {
        config.password.clone_from(&args.password);
    }
    if args.key_file.is_some() {
        config.key_file.clone_from(&args.key_file);
    }
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if args.legacy_ciphers {
        config.legacy_ciphers = true;
    }
    if args.prompt.is_some() {
        config.prompt_pattern.clone_from(&args.prompt);
    }
    for feature in &args.enable {
        config.features.set(*feature, true);
    }
    for feature in &args.disable {
        config.features.set(*feature, false);
    }
}

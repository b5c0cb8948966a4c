//! `netprobe` CLI - polls network devices over an interactive SSH shell
//!
//! Runs one collection cycle and prints Prometheus text, lists metric
//! descriptors, or validates a configuration file.

mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use cli::Cli;
use error::CliError;
use netprobe_core::NetprobeError;
use netprobe_core::tracing::{TracingConfig, TracingLevel, TracingOutput, init_tracing};

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let level = if cli.debug {
        TracingLevel::Debug.max(TracingLevel::from_verbosity(cli.verbose, cli.quiet))
    } else {
        TracingLevel::from_verbosity(cli.verbose, cli.quiet)
    };
    let mut tracing_config = TracingConfig::new().with_level(level);
    if let Some(path) = &cli.log_file {
        tracing_config = tracing_config.with_output(TracingOutput::File { path: path.clone() });
    }
    if let Some(filter) = &cli.log_filter {
        tracing_config = tracing_config.with_filter(filter.as_str());
    }
    if let Err(e) = init_tracing(&tracing_config) {
        eprintln!("Error: {}", CliError::from(NetprobeError::from(e)));
    }

    let result = commands::dispatch(config_path, cli.debug, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}

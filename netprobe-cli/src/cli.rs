//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use netprobe_core::Feature;

/// Polls network devices over an interactive SSH shell
#[derive(Parser)]
#[command(name = "netprobe")]
#[command(author, version, about = "Poll network devices and print gauge metrics")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, global = true, env = "NETPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log every command sent and every parse failure
    #[arg(long, global = true)]
    pub debug: bool,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter directive, e.g. `netprobe_core=trace,russh=debug`
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run one collection cycle and print the samples
    #[command(about = "Poll every target once and print the metrics")]
    Scrape {
        #[command(flatten)]
        targets: TargetArgs,

        /// Output format
        #[arg(short, long, default_value = "text", value_enum)]
        format: OutputFormat,
    },

    /// List the metric families the enabled collectors expose
    #[command(about = "Print every metric descriptor for the enabled features")]
    Describe {
        #[command(flatten)]
        targets: TargetArgs,
    },

    /// Validate the configuration
    #[command(about = "Validate the configuration and list resolved targets")]
    Check {
        #[command(flatten)]
        targets: TargetArgs,
    },

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Flags that build or override the device list
#[derive(Args, Debug, Default, Clone)]
pub struct TargetArgs {
    /// Comma-separated `host[:port]` list; replaces configured devices
    #[arg(long, value_name = "HOSTS")]
    pub targets: Option<String>,

    /// Login name
    #[arg(long, value_name = "NAME")]
    pub user: Option<String>,

    /// Password
    #[arg(long, env = "NETPROBE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Private key file
    #[arg(long, value_name = "PATH")]
    pub key_file: Option<String>,

    /// Connect and per-command timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Maximum bytes read from the shell at once
    #[arg(long, value_name = "BYTES")]
    pub batch_size: Option<usize>,

    /// Allow CBC ciphers for old firmware
    #[arg(long)]
    pub legacy_ciphers: bool,

    /// Custom prompt regex
    #[arg(long, value_name = "REGEX")]
    pub prompt: Option<String>,

    /// Features to turn on (bgp, environment, facts, interfaces, optics, neighbors)
    #[arg(long, value_delimiter = ',', value_name = "FEATURE")]
    pub enable: Vec<Feature>,

    /// Features to turn off
    #[arg(long, value_delimiter = ',', value_name = "FEATURE")]
    pub disable: Vec<Feature>,
}

/// Output format for scrape results
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Prometheus text exposition
    #[default]
    Text,
    /// Per-target poll summary as JSON
    Json,
}

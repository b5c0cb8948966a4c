//! `netprobe` Core Library
//!
//! Polls network devices over an interactive SSH shell, runs diagnostic
//! commands, and turns the parsed output into gauge samples.
//!
//! # Crate Structure
//!
//! - [`transport`] - Interactive shell sessions with prompt-based completion detection
//! - [`device`] - OS-family identification on top of a session
//! - [`collector`] - Collector trait, the shared collector registry, one collector per metric family
//! - [`parsers`] - Text parsers turning command output into fact records
//! - [`orchestrator`] - Concurrent per-target polling with liveness and duration accounting
//! - [`metrics`] - Metric descriptors, samples, sinks and text exposition
//! - [`config`] - YAML configuration and target resolution
//! - [`tracing`] - Structured logging setup
//! - [`testing`] - Scripted in-memory shells for exercising sessions without a device

#![warn(missing_docs)]

pub mod collector;
pub mod config;
pub mod device;
pub mod error;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod parsers;
pub mod testing;
pub mod tracing;
pub mod transport;

pub use collector::{CollectError, CollectResult, Collector, CollectorRegistry};
pub use config::{Config, DeviceConfig, FeatureConfig};
pub use device::{DeviceClient, IDENTIFY_COMMAND, OsFamily};
pub use error::{
    ConfigError, ConfigResult, DeviceError, DeviceResult, NetprobeError, SessionError,
    SessionResult,
};
pub use metrics::{
    ChannelSink, DescriptorSet, MemorySink, MetricDesc, MetricSink, Sample, SampleKind, SinkError,
    render_text,
};
pub use models::{AuthMethod, Feature, FeatureSet, Target};
pub use orchestrator::{
    COLLECTOR_PANICKED, CollectorFailure, METRIC_PREFIX, Orchestrator, PollState, ScrapeSummary,
    TargetReport,
};
pub use parsers::{ParseError, ParseResult};
pub use transport::{
    Connector, DEFAULT_PROMPT_PATTERN, PAGER_DISABLE_COMMAND, PromptMatcher, Session,
    SessionOptions, ShellChannel, SshConnector, SshProfile,
};

//! Collectors turn command output into samples
//!
//! A collector is stateless after construction. One instance per feature is
//! shared by every target that enables it, so `collect` only touches the
//! device client and sink it is handed.

mod bgp;
mod environment;
mod facts;
mod interfaces;
mod neighbors;
mod optics;
mod registry;

pub use bgp::BgpCollector;
pub use environment::EnvironmentCollector;
pub use facts::FactsCollector;
pub use interfaces::InterfacesCollector;
pub use neighbors::NeighborsCollector;
pub use optics::OpticsCollector;
pub use registry::{CollectorRegistry, build_collector};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::device::DeviceClient;
use crate::error::SessionError;
use crate::metrics::{MetricDesc, MetricSink, Sample};
use crate::models::Feature;
use crate::parsers::ParseError;

/// Errors a collector reports to the orchestrator
#[derive(Debug, Error)]
pub enum CollectError {
    /// A command failed
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Output could not be parsed where a record is mandatory
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CollectError {
    /// Returns true when the device closed the session
    #[must_use]
    pub const fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::Session(SessionError::EndOfStream))
    }
}

/// Result type for collectors
pub type CollectResult<T> = Result<T, CollectError>;

/// Produces one metric family from a device
#[async_trait]
pub trait Collector: Send + Sync {
    /// Name used in logs and the per-collector duration label
    fn name(&self) -> &'static str;

    /// Feature this collector implements
    fn feature(&self) -> Feature;

    /// Descriptors of every sample this collector may push
    fn describe(&self) -> Vec<Arc<MetricDesc>>;

    /// Runs commands on the device and pushes samples
    ///
    /// `labels` starts with the target identity; collectors append their own
    /// label values.
    ///
    /// # Errors
    ///
    /// Returns an error when a command fails. Parse failures of optional
    /// output are logged and swallowed.
    async fn collect(
        &self,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()>;
}

/// Base labels followed by collector labels
pub(crate) fn labels_with(base: &[String], extra: &[&str]) -> Vec<String> {
    base.iter()
        .cloned()
        .chain(extra.iter().map(|v| (*v).to_string()))
        .collect()
}

/// Pushes a gauge
pub(crate) fn gauge(sink: &dyn MetricSink, desc: &Arc<MetricDesc>, value: f64, labels: Vec<String>) {
    sink.push(Sample::gauge(desc, value, labels));
}

pub(crate) const fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Logs a swallowed parse failure when the client runs in debug mode
pub(crate) fn log_parse_failure(client: &DeviceClient<'_>, what: &str, err: &ParseError) {
    if client.debug() {
        tracing::debug!(target_host = %client.target(), what, error = %err, "Parse failed");
    }
}

/// Turns a parse failure into "no samples" and keeps session errors
pub(crate) fn tolerate_parse(
    client: &DeviceClient<'_>,
    what: &str,
    result: CollectResult<()>,
) -> CollectResult<()> {
    match result {
        Err(CollectError::Parse(e)) => {
            log_parse_failure(client, what, &e);
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::device::DeviceClient;
    use crate::testing::{ScriptedShell, ShellScript};
    use crate::transport::{Session, SessionOptions};

    /// Opens a session on a scripted device that identifies as `banner`
    pub async fn session(script: ShellScript, banner: &str) -> Session {
        let script = script.respond(crate::device::IDENTIFY_COMMAND, banner);
        Session::open("r1", Box::new(ScriptedShell::new(script)), SessionOptions::default())
            .await
            .unwrap()
    }

    pub async fn identify(session: &mut Session) -> DeviceClient<'_> {
        DeviceClient::identify(session, true).await.unwrap()
    }

    pub const IOSXE_BANNER: &str = "Cisco IOS XE Software, Version 17.03.04 - Extended Support Release";
    pub const IOS_BANNER: &str =
        "Cisco IOS Software, C2960 Software (C2960-LANBASEK9-M), Version 15.0(2)SE11, RELEASE SOFTWARE (fc3)";
    pub const NXOS_BANNER: &str = "Cisco Nexus Operating System (NX-OS) Software\n  NXOS: version 9.3(8)";

    pub fn labels() -> Vec<String> {
        vec!["r1".to_string()]
    }
}

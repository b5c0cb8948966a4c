//! Concurrent polling of every target
//!
//! One task per target is spawned into a [`JoinSet`]. Each task connects,
//! identifies the device, runs its collectors in order and always closes
//! the session. Liveness and poll duration are emitted exactly once per
//! task, whatever the outcome.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::collector::{Collector, CollectorRegistry, build_collector};
use crate::device::{DeviceClient, OsFamily};
use crate::metrics::{MetricDesc, MetricSink, Sample};
use crate::models::{FeatureSet, Target};
use crate::tracing::span_names;
use crate::transport::{Connector, Session};
use crate::{trace_operation, trace_operation_debug};

/// Prefix of every metric family
pub const METRIC_PREFIX: &str = "cisco_";

/// Failure message recorded for a collector that panicked
pub const COLLECTOR_PANICKED: &str = "collector panicked";

/// Where a target's poll is, or where it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollState {
    /// Dialing and authenticating
    Connecting,
    /// Running the identification command
    Identifying,
    /// Running collector `index` of `total`
    Running {
        /// Zero-based position in the target's collector list
        index: usize,
        /// Number of collectors for the target
        total: usize,
    },
    /// Every collector ran
    Done,
    /// The poll stopped before any collector ran
    Aborted,
}

impl PollState {
    /// True for `Done` and `Aborted`
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// A collector that returned an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorFailure {
    /// Collector name
    pub collector: &'static str,
    /// Error message
    pub error: String,
}

/// Outcome of one target's poll
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    /// Target identity
    pub target: String,
    /// Terminal state
    pub state: PollState,
    /// Detected OS family, if identification succeeded
    pub os: Option<OsFamily>,
    /// Reason the poll was aborted
    pub error: Option<String>,
    /// Collectors that failed
    pub collector_failures: Vec<CollectorFailure>,
    /// Wall time of the poll
    pub elapsed_ms: u64,
}

impl TargetReport {
    fn new(target: String) -> Self {
        Self {
            target,
            state: PollState::Connecting,
            os: None,
            error: None,
            collector_failures: Vec::new(),
            elapsed_ms: 0,
        }
    }

    fn abort(&mut self, error: impl ToString) {
        self.state = PollState::Aborted;
        self.error = Some(error.to_string());
    }

    /// True when every collector ran
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state == PollState::Done
    }
}

/// Per-target outcomes of one collection cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeSummary {
    /// Number of targets polled
    pub total: usize,
    /// Targets that reached `Done`
    pub succeeded: usize,
    /// Targets that were aborted
    pub aborted: usize,
    /// Collector failures across all targets
    pub collector_failures: usize,
    /// Reports in target order
    pub reports: Vec<TargetReport>,
}

impl ScrapeSummary {
    /// Creates a summary from a list of reports
    #[must_use]
    pub fn from_reports(reports: Vec<TargetReport>) -> Self {
        let total = reports.len();
        let succeeded = reports.iter().filter(|r| r.succeeded()).count();
        let collector_failures = reports.iter().map(|r| r.collector_failures.len()).sum();
        Self {
            total,
            succeeded,
            aborted: total - succeeded,
            collector_failures,
            reports,
        }
    }

    /// True when there were targets and none of them succeeded
    #[must_use]
    pub const fn all_failed(&self) -> bool {
        self.total > 0 && self.succeeded == 0
    }

    /// True when any target aborted or any collector failed
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.aborted > 0 || self.collector_failures > 0
    }

    /// Report for a target identity
    #[must_use]
    pub fn report(&self, target: &str) -> Option<&TargetReport> {
        self.reports.iter().find(|r| r.target == target)
    }
}

/// Liveness and timing descriptors owned by the orchestrator
#[derive(Debug)]
struct CoreDescriptors {
    up: Arc<MetricDesc>,
    poll_duration: Arc<MetricDesc>,
    collect_duration: Arc<MetricDesc>,
}

impl CoreDescriptors {
    fn new() -> Self {
        Self {
            up: MetricDesc::new(
                format!("{METRIC_PREFIX}up"),
                "Scrape of target was successful",
                &["target"],
            ),
            poll_duration: MetricDesc::new(
                format!("{METRIC_PREFIX}collector_duration_seconds"),
                "Duration of a scrape for one target",
                &["target"],
            ),
            collect_duration: MetricDesc::new(
                format!("{METRIC_PREFIX}collect_duration_seconds"),
                "Duration of a scrape by collector for one target",
                &["target", "collector"],
            ),
        }
    }

    fn all(&self) -> [Arc<MetricDesc>; 3] {
        [
            Arc::clone(&self.up),
            Arc::clone(&self.poll_duration),
            Arc::clone(&self.collect_duration),
        ]
    }
}

/// Pushes the poll duration when dropped
///
/// Dropping happens on every exit path of the task, unwinding included.
struct PollTimer {
    sink: Arc<dyn MetricSink>,
    desc: Arc<MetricDesc>,
    labels: Vec<String>,
    started: Instant,
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.sink.push(Sample::gauge(
            &self.desc,
            self.started.elapsed().as_secs_f64(),
            std::mem::take(&mut self.labels),
        ));
    }
}

/// Everything a target task needs, cloned out of the orchestrator
#[derive(Clone)]
struct PollContext {
    registry: Arc<CollectorRegistry>,
    connector: Arc<dyn Connector>,
    core: Arc<CoreDescriptors>,
    debug: bool,
}

/// Runs collection cycles over a fixed set of targets
pub struct Orchestrator {
    targets: Vec<Target>,
    context: PollContext,
}

impl Orchestrator {
    /// Creates an orchestrator
    ///
    /// The registry should have been built from the same targets.
    #[must_use]
    pub fn new(
        targets: Vec<Target>,
        registry: CollectorRegistry,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            targets,
            context: PollContext {
                registry: Arc::new(registry),
                connector,
                core: Arc::new(CoreDescriptors::new()),
                debug: false,
            },
        }
    }

    /// Enables per-command and parse-failure logging
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.context.debug = debug;
        self
    }

    /// Targets polled by each cycle
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Shared collector registry
    #[must_use]
    pub fn registry(&self) -> &CollectorRegistry {
        &self.context.registry
    }

    /// Every descriptor a cycle may emit: liveness, durations, collectors
    #[must_use]
    pub fn describe(&self) -> Vec<Arc<MetricDesc>> {
        let mut descriptors = self.context.core.all().to_vec();
        descriptors.extend(self.context.registry.describe());
        descriptors
    }

    /// Descriptors a cycle would expose for `features`, without building targets
    #[must_use]
    pub fn describe_features(features: FeatureSet) -> Vec<Arc<MetricDesc>> {
        let mut descriptors = CoreDescriptors::new().all().to_vec();
        descriptors.extend(features.iter().flat_map(|f| build_collector(f).describe()));
        descriptors
    }

    /// Polls every target concurrently and waits for all of them
    pub async fn collect_all(&self, sink: Arc<dyn MetricSink>) -> ScrapeSummary {
        let span = trace_operation!(span_names::SCRAPE, targets = self.targets.len());
        async {
            let mut tasks = JoinSet::new();
            for (index, target) in self.targets.iter().enumerate() {
                let context = self.context.clone();
                let target = target.clone();
                let sink = Arc::clone(&sink);
                tasks.spawn(async move {
                    let identity = target.identity();
                    let report = AssertUnwindSafe(poll_target(context, target, sink))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            tracing::error!(target_host = %identity, "Poll task panicked");
                            let mut report = TargetReport::new(identity);
                            report.abort("poll task panicked");
                            report
                        });
                    (index, report)
                });
            }

            let mut reports = Vec::with_capacity(self.targets.len());
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(entry) => reports.push(entry),
                    Err(e) => tracing::error!(error = %e, "Poll task did not finish"),
                }
            }
            reports.sort_by_key(|(index, _)| *index);

            let summary =
                ScrapeSummary::from_reports(reports.into_iter().map(|(_, r)| r).collect());
            tracing::info!(
                total = summary.total,
                succeeded = summary.succeeded,
                collector_failures = summary.collector_failures,
                "Collection cycle finished"
            );
            summary
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("targets", &self.targets.len())
            .field("registry", &self.context.registry)
            .field("debug", &self.context.debug)
            .finish_non_exhaustive()
    }
}

async fn poll_target(
    context: PollContext,
    target: Target,
    sink: Arc<dyn MetricSink>,
) -> TargetReport {
    let identity = target.identity();
    let labels = vec![identity.clone()];
    let started = Instant::now();
    let _timer = PollTimer {
        sink: Arc::clone(&sink),
        desc: Arc::clone(&context.core.poll_duration),
        labels: labels.clone(),
        started,
    };
    let span = trace_operation!(span_names::TARGET_POLL, target_host = %identity);

    async {
        let mut report = TargetReport::new(identity.clone());
        match context.connector.connect(&target).await {
            Ok(mut session) => {
                sink.push(Sample::gauge(&context.core.up, 1.0, labels.clone()));
                report.state = PollState::Identifying;
                run_collectors(&context, &target, &mut session, sink.as_ref(), &mut report).await;
                session.close().await;
            }
            Err(e) => {
                sink.push(Sample::gauge(&context.core.up, 0.0, labels.clone()));
                tracing::warn!(target_host = %identity, error = %e, "Connection failed");
                report.abort(e);
            }
        }
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(
            target_host = %identity,
            state = ?report.state,
            duration_ms = report.elapsed_ms,
            "Target poll finished"
        );
        report
    }
    .instrument(span)
    .await
}

async fn run_collectors(
    context: &PollContext,
    target: &Target,
    session: &mut Session,
    sink: &dyn MetricSink,
    report: &mut TargetReport,
) {
    let identity = session.identity().to_string();
    let mut client = match DeviceClient::identify(session, context.debug).await {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(target_host = %identity, error = %e, "Identification failed");
            report.abort(e);
            return;
        }
    };
    report.os = Some(client.os_family());

    let labels = vec![identity.clone()];
    let collectors = context.registry.collectors_for(target);
    let total = collectors.len();
    for (index, collector) in collectors.iter().enumerate() {
        report.state = PollState::Running { index, total };
        if !run_one(context, collector.as_ref(), &mut client, sink, &labels, report).await {
            tracing::debug!(
                target_host = %identity,
                skipped = total - index - 1,
                "Session ended, skipping remaining collectors"
            );
            break;
        }
    }
    report.state = PollState::Done;
}

/// Runs one collector; returns false once the device has closed the session
///
/// A panicking collector is recorded as a failure like any other error.
async fn run_one(
    context: &PollContext,
    collector: &dyn Collector,
    client: &mut DeviceClient<'_>,
    sink: &dyn MetricSink,
    labels: &[String],
    report: &mut TargetReport,
) -> bool {
    let name = collector.name();
    let started = Instant::now();
    let result = AssertUnwindSafe(
        collector
            .collect(client, sink, labels)
            .instrument(trace_operation_debug!(span_names::COLLECTOR_RUN, collector = name)),
    )
    .catch_unwind()
    .await;

    let mut duration_labels = labels.to_vec();
    duration_labels.push(name.to_string());
    sink.push(Sample::gauge(
        &context.core.collect_duration,
        started.elapsed().as_secs_f64(),
        duration_labels,
    ));

    let error = match result {
        Ok(Ok(())) => return true,
        Ok(Err(e)) if e.is_end_of_stream() => return false,
        Ok(Err(e)) => {
            tracing::warn!(target_host = %client.target(), collector = name, error = %e, "Collector failed");
            e.to_string()
        }
        Err(_) => {
            tracing::error!(
                target_host = %client.target(),
                collector = name,
                "Collector panicked"
            );
            COLLECTOR_PANICKED.to_string()
        }
    };
    report.collector_failures.push(CollectorFailure {
        collector: name,
        error,
    });
    true
}

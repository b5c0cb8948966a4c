//! Collection cycles over scripted devices

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use netprobe_core::collector::build_collector;
use netprobe_core::parsers::interfaces::INTERFACES_COMMAND;
use netprobe_core::parsers::optics::interface_list_command;
use netprobe_core::testing::{FakeDevice, ScriptedConnector, ShellScript};
use netprobe_core::{
    AuthMethod, COLLECTOR_PANICKED, CollectResult, Collector, CollectorRegistry, Connector,
    DescriptorSet, DeviceClient, Feature, FeatureSet, IDENTIFY_COMMAND, MemorySink, MetricDesc,
    MetricSink, Orchestrator, OsFamily, PollState, Session, SessionResult, Target, render_text,
};

use super::IOS_BANNER;

fn target(host: &str, features: &[Feature]) -> Target {
    Target::new(host, 22, AuthMethod::password("u", "p"))
        .with_timeout(Duration::from_millis(300))
        .with_features(features.iter().copied().collect())
}

fn ios(host: &str) -> ShellScript {
    ShellScript::new(host).respond(IDENTIFY_COMMAND, IOS_BANNER)
}

fn build(targets: Vec<Target>, connector: ScriptedConnector) -> Orchestrator {
    build_with(targets, Arc::new(connector))
}

fn build_with(targets: Vec<Target>, connector: Arc<dyn Connector>) -> Orchestrator {
    let registry = CollectorRegistry::for_targets(&targets);
    Orchestrator::new(targets, registry, connector)
}

fn value(sink: &MemorySink, name: &str, target: &str) -> Option<f64> {
    sink.by_name(name)
        .iter()
        .find(|s| s.label("target") == Some(target))
        .map(|s| s.value)
}

#[tokio::test]
async fn test_unreachable_target_does_not_affect_others() {
    let connector = ScriptedConnector::new()
        .with_device("r1", FakeDevice::Shell(ios("r1")))
        .with_device("r2", FakeDevice::Unreachable)
        .with_device("r3", FakeDevice::Shell(ios("r3")));
    let targets = ["r1", "r2", "r3"]
        .iter()
        .map(|h| target(h, &[Feature::Facts]))
        .collect();
    let orchestrator = build(targets, connector);
    let sink = Arc::new(MemorySink::new());

    let summary = orchestrator.collect_all(sink.clone()).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.aborted, 1);
    let order: Vec<_> = summary.reports.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(order, vec!["r1", "r2", "r3"]);

    assert_eq!(value(&sink, "cisco_up", "r1"), Some(1.0));
    assert_eq!(value(&sink, "cisco_up", "r2"), Some(0.0));
    assert_eq!(value(&sink, "cisco_up", "r3"), Some(1.0));
    assert_eq!(sink.by_name("cisco_collector_duration_seconds").len(), 3);
    assert!(value(&sink, "cisco_collect_duration_seconds", "r2").is_none());
    assert!(
        summary.report("r2").unwrap().error.as_deref().unwrap().contains("connection refused")
    );
}

#[tokio::test]
async fn test_unknown_os_aborts_after_connecting() {
    let script = ShellScript::new("box").respond(IDENTIFY_COMMAND, "Linux box 6.1.0 x86_64");
    let closes = script.close_counter();
    let log = script.command_log();
    let connector = ScriptedConnector::new().with_device("box", FakeDevice::Shell(script));
    let orchestrator = build(vec![target("box", &[Feature::Facts, Feature::Bgp])], connector);
    let sink = Arc::new(MemorySink::new());

    let summary = orchestrator.collect_all(sink.clone()).await;

    let report = summary.report("box").unwrap();
    assert_eq!(report.state, PollState::Aborted);
    assert_eq!(report.os, None);
    assert!(report.error.is_some());
    assert_eq!(value(&sink, "cisco_up", "box"), Some(1.0));
    assert!(sink.by_name("cisco_collect_duration_seconds").is_empty());
    assert_eq!(sink.by_name("cisco_collector_duration_seconds").len(), 1);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(log.count(IDENTIFY_COMMAND), 1);
}

#[tokio::test]
async fn test_hanging_collector_is_recorded_and_later_collectors_run() {
    let slow = ios("r1").hang(INTERFACES_COMMAND);
    let slow_log = slow.command_log();
    let connector = ScriptedConnector::new()
        .with_device("r1", FakeDevice::Shell(slow))
        .with_device("r2", FakeDevice::Shell(ios("r2")));
    let features = [Feature::Facts, Feature::Interfaces, Feature::Optics];
    let orchestrator = build(
        vec![target("r1", &features), target("r2", &features)],
        connector,
    );
    let sink = Arc::new(MemorySink::new());

    let summary = orchestrator.collect_all(sink.clone()).await;

    let r1 = summary.report("r1").unwrap();
    assert_eq!(r1.state, PollState::Done);
    assert_eq!(r1.collector_failures.len(), 1);
    assert_eq!(r1.collector_failures[0].collector, "Interfaces");
    assert!(r1.collector_failures[0].error.contains("Timeout"));
    assert_eq!(slow_log.count(interface_list_command(OsFamily::Ios)), 1);

    let r2 = summary.report("r2").unwrap();
    assert!(r2.succeeded());
    assert!(r2.collector_failures.is_empty());
    assert_eq!(summary.collector_failures, 1);
    assert!(summary.has_failures());
    assert!(!summary.all_failed());

    let r1_collectors: Vec<_> = sink
        .by_name("cisco_collect_duration_seconds")
        .into_iter()
        .filter(|s| s.label("target") == Some("r1"))
        .filter_map(|s| s.label("collector").map(str::to_string))
        .collect();
    assert_eq!(r1_collectors, vec!["Facts", "Interfaces", "Optics"]);
    let waited = sink
        .by_name("cisco_collect_duration_seconds")
        .iter()
        .find(|s| s.label("target") == Some("r1") && s.label("collector") == Some("Interfaces"))
        .map(|s| s.value)
        .unwrap();
    assert!(waited >= 0.29, "timed-out collector took {waited}s");
    assert_eq!(
        sink.by_name("cisco_facts_version")
            .iter()
            .filter(|s| s.label("version") == Some("IOS-15.0(2)SE11"))
            .count(),
        2
    );
}

#[tokio::test]
async fn test_end_of_stream_skips_remaining_collectors() {
    let script = ios("r1").hang_up(INTERFACES_COMMAND);
    let log = script.command_log();
    let closes = script.close_counter();
    let connector = ScriptedConnector::new().with_device("r1", FakeDevice::Shell(script));
    let orchestrator = build(
        vec![target("r1", &[Feature::Facts, Feature::Interfaces, Feature::Optics])],
        connector,
    );
    let sink = Arc::new(MemorySink::new());

    let summary = orchestrator.collect_all(sink.clone()).await;

    let report = summary.report("r1").unwrap();
    assert_eq!(report.state, PollState::Done);
    assert!(report.collector_failures.is_empty());
    assert_eq!(log.count(interface_list_command(OsFamily::Ios)), 0);
    assert_eq!(sink.by_name("cisco_collect_duration_seconds").len(), 2);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_descriptors_are_unique_and_cover_every_sample() {
    let all: FeatureSet = Feature::ALL.into_iter().collect();
    let targets = vec![
        target("r1", &[Feature::Facts, Feature::Interfaces]),
        target("r2", &[Feature::Facts]).with_features(all),
        target("r3", &[Feature::Facts]),
    ];
    let connector = ScriptedConnector::new()
        .with_device("r1", FakeDevice::Shell(ios("r1")))
        .with_device("r2", FakeDevice::Shell(ios("r2")))
        .with_device("r3", FakeDevice::Unreachable);
    let orchestrator = build(targets, connector);
    assert_eq!(orchestrator.registry().len(), Feature::ALL.len());

    let described = orchestrator.describe();
    let names: HashSet<_> = described.iter().map(|d| d.name().to_string()).collect();
    assert_eq!(names.len(), described.len());
    assert_eq!(described.len(), 32);

    let mut descriptors = DescriptorSet::new();
    descriptors.register_all(described.iter()).unwrap();
    // a second pass is a no-op
    descriptors.register_all(orchestrator.describe().iter()).unwrap();
    assert_eq!(descriptors.len(), 32);

    let sink = Arc::new(MemorySink::new());
    orchestrator.collect_all(sink.clone()).await;
    let text = render_text(&descriptors, &sink.take()).unwrap();
    assert!(text.contains("# TYPE cisco_up gauge"));
    assert!(text.contains("cisco_up{target=\"r3\"} 0"));
    assert!(text.contains("cisco_facts_version{target=\"r1\",version=\"IOS-15.0(2)SE11\"} 1"));
}

#[derive(Debug)]
struct PanickingCollector;

#[async_trait]
impl Collector for PanickingCollector {
    fn name(&self) -> &'static str {
        "Panicking"
    }

    fn feature(&self) -> Feature {
        Feature::Bgp
    }

    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        Vec::new()
    }

    async fn collect(
        &self,
        _client: &mut DeviceClient<'_>,
        _sink: &dyn MetricSink,
        _labels: &[String],
    ) -> CollectResult<()> {
        panic!("collector bug");
    }
}

#[tokio::test]
async fn test_panicking_collector_does_not_stop_siblings() {
    let script = ios("r1");
    let closes = script.close_counter();
    let targets = vec![
        target("r1", &[Feature::Bgp, Feature::Facts]),
        target("r2", &[Feature::Environment]),
    ];
    let registry = CollectorRegistry::with_factory(&targets, |feature| match feature {
        Feature::Bgp => Arc::new(PanickingCollector),
        other => build_collector(other),
    });
    let connector = ScriptedConnector::new()
        .with_device("r1", FakeDevice::Shell(script))
        .with_device("r2", FakeDevice::Shell(ios("r2")));
    let orchestrator = Orchestrator::new(targets, registry, Arc::new(connector));
    let sink = Arc::new(MemorySink::new());

    let summary = orchestrator.collect_all(sink.clone()).await;

    let r1 = summary.report("r1").unwrap();
    assert_eq!(r1.state, PollState::Done);
    assert_eq!(r1.collector_failures.len(), 1);
    assert_eq!(r1.collector_failures[0].collector, "Panicking");
    assert_eq!(r1.collector_failures[0].error, COLLECTOR_PANICKED);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(
        sink.by_name("cisco_facts_version")
            .iter()
            .any(|s| s.label("target") == Some("r1"))
    );
    let r1_collectors: Vec<_> = sink
        .by_name("cisco_collect_duration_seconds")
        .into_iter()
        .filter(|s| s.label("target") == Some("r1"))
        .filter_map(|s| s.label("collector").map(str::to_string))
        .collect();
    assert_eq!(r1_collectors, vec!["Panicking", "Facts"]);
    assert!(summary.report("r2").unwrap().succeeded());
}

/// Panics while dialing one host, delegates the rest
struct PanickingConnector {
    host: &'static str,
    inner: ScriptedConnector,
}

#[async_trait]
impl Connector for PanickingConnector {
    async fn connect(&self, target: &Target) -> SessionResult<Session> {
        if target.host == self.host {
            panic!("connector bug");
        }
        self.inner.connect(target).await
    }
}

#[tokio::test]
async fn test_panicking_task_is_reported_and_others_finish() {
    let targets = vec![
        target("r1", &[Feature::Facts]),
        target("r2", &[Feature::Facts]),
    ];
    let connector = PanickingConnector {
        host: "r1",
        inner: ScriptedConnector::new().with_device("r2", FakeDevice::Shell(ios("r2"))),
    };
    let orchestrator = build_with(targets, Arc::new(connector));
    let sink = Arc::new(MemorySink::new());

    let summary = orchestrator.collect_all(sink.clone()).await;

    let r1 = summary.report("r1").unwrap();
    assert_eq!(r1.state, PollState::Aborted);
    assert_eq!(r1.error.as_deref(), Some("poll task panicked"));
    assert!(summary.report("r2").unwrap().succeeded());
    // the poll timer still fires while unwinding
    assert!(value(&sink, "cisco_collector_duration_seconds", "r1").is_some());
}

#[tokio::test]
async fn test_empty_target_list() {
    let orchestrator = build(Vec::new(), ScriptedConnector::new());
    let sink = Arc::new(MemorySink::new());
    let summary = orchestrator.collect_all(sink.clone()).await;
    assert_eq!(summary.total, 0);
    assert!(!summary.all_failed());
    assert!(sink.is_empty());
}

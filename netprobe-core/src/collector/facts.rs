use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectResult, Collector, gauge, labels_with, tolerate_parse};
use crate::device::DeviceClient;
use crate::metrics::{MetricDesc, MetricSink};
use crate::models::Feature;
use crate::orchestrator::METRIC_PREFIX;
use crate::parsers::facts::{
    CPU_COMMAND, MEMORY_COMMAND, VERSION_COMMAND, parse_cpu, parse_memory, parse_version,
};

/// Version, memory and CPU facts
///
/// A part whose output does not parse is skipped and the next part still
/// runs. A failed command ends the collector.
#[derive(Debug)]
pub struct FactsCollector {
    version: Arc<MetricDesc>,
    memory_total: Arc<MetricDesc>,
    memory_used: Arc<MetricDesc>,
    memory_free: Arc<MetricDesc>,
    cpu_one_minute: Arc<MetricDesc>,
    cpu_five_seconds: Arc<MetricDesc>,
    cpu_interrupts: Arc<MetricDesc>,
    cpu_five_minutes: Arc<MetricDesc>,
}

impl FactsCollector {
    /// Creates the collector and its descriptors
    #[must_use]
    pub fn new() -> Self {
        let prefix = format!("{METRIC_PREFIX}facts_");
        let desc = |name: &str, help: &str, labels: &[&str]| {
            MetricDesc::new(format!("{prefix}{name}"), help, labels)
        };
        Self {
            version: desc("version", "Running OS version", &["target", "version"]),
            memory_total: desc("memory_total", "Total memory", &["target", "type"]),
            memory_used: desc("memory_used", "Used memory", &["target", "type"]),
            memory_free: desc("memory_free", "Free memory", &["target", "type"]),
            cpu_one_minute: desc(
                "cpu_one_minute_percent",
                "CPU utilization for one minute",
                &["target"],
            ),
            cpu_five_seconds: desc(
                "cpu_five_seconds_percent",
                "CPU utilization for five seconds",
                &["target"],
            ),
            cpu_interrupts: desc("cpu_interrupt_percent", "Interrupt percentage", &["target"]),
            cpu_five_minutes: desc(
                "cpu_five_minutes_percent",
                "CPU utilization for five minutes",
                &["target"],
            ),
        }
    }

    async fn collect_version(
        &self,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()> {
        let output = client.run(VERSION_COMMAND).await?;
        let version = parse_version(client.os_family(), &output)?;
        gauge(sink, &self.version, 1.0, labels_with(labels, &[&version]));
        Ok(())
    }

    async fn collect_memory(
        &self,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()> {
        let output = client.run(MEMORY_COMMAND).await?;
        for pool in parse_memory(client.os_family(), &output)? {
            let l = labels_with(labels, &[&pool.pool]);
            gauge(sink, &self.memory_total, pool.total, l.clone());
            gauge(sink, &self.memory_used, pool.used, l.clone());
            gauge(sink, &self.memory_free, pool.free, l);
        }
        Ok(())
    }

    async fn collect_cpu(
        &self,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()> {
        let output = client.run(CPU_COMMAND).await?;
        let cpu = parse_cpu(client.os_family(), &output)?;
        gauge(sink, &self.cpu_one_minute, cpu.one_minute, labels.to_vec());
        gauge(sink, &self.cpu_five_seconds, cpu.five_seconds, labels.to_vec());
        gauge(sink, &self.cpu_interrupts, cpu.interrupts, labels.to_vec());
        gauge(sink, &self.cpu_five_minutes, cpu.five_minutes, labels.to_vec());
        Ok(())
    }
}

impl Default for FactsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for FactsCollector {
    fn name(&self) -> &'static str {
        "Facts"
    }

    fn feature(&self) -> Feature {
        Feature::Facts
    }

    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![
            Arc::clone(&self.version),
            Arc::clone(&self.memory_total),
            Arc::clone(&self.memory_used),
            Arc::clone(&self.memory_free),
            Arc::clone(&self.cpu_one_minute),
            Arc::clone(&self.cpu_five_seconds),
            Arc::clone(&self.cpu_interrupts),
            Arc::clone(&self.cpu_five_minutes),
        ]
    }

    async fn collect(
        &self,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()> {
        let result = self.collect_version(client, sink, labels).await;
        tolerate_parse(client, "version", result)?;
        let result = self.collect_memory(client, sink, labels).await;
        tolerate_parse(client, "memory", result)?;
        let result = self.collect_cpu(client, sink, labels).await;
        tolerate_parse(client, "cpu", result)?;
        Ok(())
    }
}

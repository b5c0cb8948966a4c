use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectResult, Collector, flag, gauge, labels_with, log_parse_failure};
use crate::device::DeviceClient;
use crate::metrics::{MetricDesc, MetricSink};
use crate::models::Feature;
use crate::orchestrator::METRIC_PREFIX;
use crate::parsers::environment::{self, EnvironmentItem};

/// Temperature sensors and power supplies
#[derive(Debug)]
pub struct EnvironmentCollector {
    temperature: Arc<MetricDesc>,
    temperature_status: Arc<MetricDesc>,
    power_supply: Arc<MetricDesc>,
}

impl EnvironmentCollector {
    /// Creates the collector and its descriptors
    #[must_use]
    pub fn new() -> Self {
        let prefix = format!("{METRIC_PREFIX}environment_");
        Self {
            temperature: MetricDesc::new(
                format!("{prefix}sensor_temp"),
                "Sensor temperatures",
                &["target", "item"],
            ),
            temperature_status: MetricDesc::new(
                format!("{prefix}sensor_status"),
                "Status of sensor temperatures (1 OK, 0 Something is wrong)",
                &["target", "item", "status"],
            ),
            power_supply: MetricDesc::new(
                format!("{prefix}power_up"),
                "Status of power supplies (1 OK, 0 Something is wrong)",
                &["target", "item", "status"],
            ),
        }
    }
}

impl Default for EnvironmentCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for EnvironmentCollector {
    fn name(&self) -> &'static str {
        "Environment"
    }

    fn feature(&self) -> Feature {
        Feature::Environment
    }

    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![
            Arc::clone(&self.temperature),
            Arc::clone(&self.temperature_status),
            Arc::clone(&self.power_supply),
        ]
    }

    async fn collect(
        &self,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()> {
        let os = client.os_family();
        let output = client.run(environment::command(os)).await?;
        let items = match environment::parse(os, &output) {
            Ok(items) => items,
            Err(e) => {
                log_parse_failure(client, "environment", &e);
                return Ok(());
            }
        };

        for item in items {
            match item {
                EnvironmentItem::Temperature {
                    name,
                    celsius,
                    status,
                    ok,
                } => {
                    gauge(sink, &self.temperature, celsius, labels_with(labels, &[&name]));
                    gauge(
                        sink,
                        &self.temperature_status,
                        flag(ok),
                        labels_with(labels, &[&name, &status]),
                    );
                }
                EnvironmentItem::PowerSupply { name, status, ok } => {
                    gauge(
                        sink,
                        &self.power_supply,
                        flag(ok),
                        labels_with(labels, &[&name, &status]),
                    );
                }
            }
        }
        Ok(())
    }
}

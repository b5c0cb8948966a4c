use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectResult, Collector, gauge, labels_with, log_parse_failure};
use crate::device::DeviceClient;
use crate::metrics::{MetricDesc, MetricSink};
use crate::models::Feature;
use crate::orchestrator::METRIC_PREFIX;
use crate::parsers::optics::{
    interface_list_command, parse_interface_list, parse_transceiver, transceiver_command,
};

/// Transceiver power levels, one command per interface
#[derive(Debug)]
pub struct OpticsCollector {
    tx: Arc<MetricDesc>,
    rx: Arc<MetricDesc>,
}

impl OpticsCollector {
    /// Creates the collector and its descriptors
    #[must_use]
    pub fn new() -> Self {
        let labels = ["target", "interface"];
        Self {
            tx: MetricDesc::new(
                format!("{METRIC_PREFIX}optics_tx"),
                "Transceiver Tx power",
                &labels,
            ),
            rx: MetricDesc::new(
                format!("{METRIC_PREFIX}optics_rx"),
                "Transceiver Rx power",
                &labels,
            ),
        }
    }
}

impl Default for OpticsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for OpticsCollector {
    fn name(&self) -> &'static str {
        "Optics"
    }

    fn feature(&self) -> Feature {
        Feature::Optics
    }

    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![Arc::clone(&self.tx), Arc::clone(&self.rx)]
    }

    async fn collect(
        &self,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()> {
        let os = client.os_family();
        let output = client.run(interface_list_command(os)).await?;
        let interfaces = match parse_interface_list(os, &output) {
            Ok(interfaces) => interfaces,
            Err(e) => {
                log_parse_failure(client, "optics interfaces", &e);
                return Ok(());
            }
        };

        for interface in interfaces {
            // IOS XE names without a slot triple have no transceiver command
            let Some(command) = transceiver_command(os, &interface) else {
                continue;
            };
            let output = client.run(&command).await?;
            match parse_transceiver(os, &output) {
                Ok(optics) => {
                    let l = labels_with(labels, &[&interface]);
                    gauge(sink, &self.tx, optics.tx_power, l.clone());
                    gauge(sink, &self.rx, optics.rx_power, l);
                }
                Err(e) => log_parse_failure(client, "transceiver", &e),
            }
        }
        Ok(())
    }
}

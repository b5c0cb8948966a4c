use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectResult, Collector, flag, gauge, labels_with, log_parse_failure};
use crate::device::{DeviceClient, OsFamily};
use crate::metrics::{MetricDesc, MetricSink};
use crate::models::Feature;
use crate::orchestrator::METRIC_PREFIX;
use crate::parsers::interfaces::{
    INTERFACES_COMMAND, Interface, VLANS_COMMAND, merge_vlan_counters, parse_interfaces,
    parse_vlans,
};

/// Per-interface counters and status
///
/// On IOS XE, byte counters of VLAN subinterfaces come from `show vlans`
/// because `show interface` reports zero for them.
#[derive(Debug)]
pub struct InterfacesCollector {
    receive_bytes: Arc<MetricDesc>,
    receive_errors: Arc<MetricDesc>,
    receive_drops: Arc<MetricDesc>,
    receive_broadcast: Arc<MetricDesc>,
    receive_multicast: Arc<MetricDesc>,
    transmit_bytes: Arc<MetricDesc>,
    transmit_errors: Arc<MetricDesc>,
    transmit_drops: Arc<MetricDesc>,
    admin_up: Arc<MetricDesc>,
    oper_up: Arc<MetricDesc>,
    error_status: Arc<MetricDesc>,
}

impl InterfacesCollector {
    /// Creates the collector and its descriptors
    #[must_use]
    pub fn new() -> Self {
        let prefix = format!("{METRIC_PREFIX}interface_");
        let labels = ["target", "name", "description", "mac", "speed"];
        let desc = |name: &str, help: &str| MetricDesc::new(format!("{prefix}{name}"), help, &labels);
        Self {
            receive_bytes: desc("receive_bytes", "Received data in bytes"),
            receive_errors: desc("receive_errors", "Number of errors caused by incoming packets"),
            receive_drops: desc("receive_drops", "Number of dropped incoming packets"),
            receive_broadcast: desc("receive_broadcast", "Received broadcast packets"),
            receive_multicast: desc("receive_multicast", "Received multicast packets"),
            transmit_bytes: desc("transmit_bytes", "Transmitted data in bytes"),
            transmit_errors: desc("transmit_errors", "Number of errors caused by outgoing packets"),
            transmit_drops: desc("transmit_drops", "Number of dropped outgoing packets"),
            admin_up: desc("admin_up", "Admin operational status"),
            oper_up: desc("up", "Interface operational status"),
            error_status: desc("error_status", "Admin and operational status differ"),
        }
    }

    fn emit(&self, sink: &dyn MetricSink, labels: &[String], item: &Interface) {
        let l = labels_with(
            labels,
            &[&item.name, &item.description, &item.mac_address, &item.speed],
        );
        let counters = [
            (&self.receive_bytes, item.input_bytes),
            (&self.receive_errors, item.input_errors),
            (&self.receive_drops, item.input_drops),
            (&self.transmit_bytes, item.output_bytes),
            (&self.transmit_errors, item.output_errors),
            (&self.transmit_drops, item.output_drops),
            (&self.receive_broadcast, item.input_broadcast),
            (&self.receive_multicast, item.input_multicast),
            (&self.admin_up, flag(item.admin_status == "up")),
            (&self.oper_up, flag(item.oper_status == "up")),
            (&self.error_status, flag(item.admin_status != item.oper_status)),
        ];
        for (desc, value) in counters {
            gauge(sink, desc, value, l.clone());
        }
    }
}

impl Default for InterfacesCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for InterfacesCollector {
    fn name(&self) -> &'static str {
        "Interfaces"
    }

    fn feature(&self) -> Feature {
        Feature::Interfaces
    }

    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        [
            &self.receive_bytes,
            &self.receive_errors,
            &self.receive_drops,
            &self.receive_broadcast,
            &self.receive_multicast,
            &self.transmit_bytes,
            &self.transmit_errors,
            &self.transmit_drops,
            &self.admin_up,
            &self.oper_up,
            &self.error_status,
        ]
        .into_iter()
        .map(Arc::clone)
        .collect()
    }

    async fn collect(
        &self,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()> {
        let os = client.os_family();
        let output = client.run(INTERFACES_COMMAND).await?;
        let mut items = match parse_interfaces(os, &output) {
            Ok(items) => items,
            Err(e) => {
                log_parse_failure(client, "interfaces", &e);
                return Ok(());
            }
        };

        if os == OsFamily::IosXe {
            let output = client.run(VLANS_COMMAND).await?;
            match parse_vlans(os, &output) {
                Ok(vlans) => merge_vlan_counters(&mut items, &vlans),
                Err(e) => {
                    log_parse_failure(client, "vlans", &e);
                    return Ok(());
                }
            }
        }

        for item in &items {
            self.emit(sink, labels, item);
        }
        Ok(())
    }
}

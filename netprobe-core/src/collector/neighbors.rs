use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectResult, Collector, gauge, labels_with, log_parse_failure};
use crate::device::{DeviceClient, OsFamily};
use crate::metrics::{MetricDesc, MetricSink};
use crate::models::Feature;
use crate::orchestrator::METRIC_PREFIX;
use crate::parsers::ParseResult;
use crate::parsers::neighbors::{
    IPV4_INTERFACES_COMMAND, IPV6_INTERFACES_COMMAND, NeighborCounts, ipv4_neighbors_command,
    ipv6_neighbors_command, parse_ipv4_interfaces, parse_ipv4_neighbors, parse_ipv6_interfaces,
    parse_ipv6_neighbors,
};

/// Commands and parsers for one address family
struct Family {
    protocol: &'static str,
    list_command: &'static str,
    parse_list: fn(OsFamily, &str) -> ParseResult<Vec<String>>,
    neighbors_command: fn(&str) -> String,
    parse_neighbors: fn(OsFamily, &str) -> ParseResult<NeighborCounts>,
}

static FAMILIES: [Family; 2] = [
    Family {
        protocol: "4",
        list_command: IPV4_INTERFACES_COMMAND,
        parse_list: parse_ipv4_interfaces,
        neighbors_command: ipv4_neighbors_command,
        parse_neighbors: parse_ipv4_neighbors,
    },
    Family {
        protocol: "6",
        list_command: IPV6_INTERFACES_COMMAND,
        parse_list: parse_ipv6_interfaces,
        neighbors_command: ipv6_neighbors_command,
        parse_neighbors: parse_ipv6_neighbors,
    },
];

/// ARP and IPv6 ND entry counts per interface and state
#[derive(Debug)]
pub struct NeighborsCollector {
    count: Arc<MetricDesc>,
}

impl NeighborsCollector {
    /// Creates the collector and its descriptor
    #[must_use]
    pub fn new() -> Self {
        Self {
            count: MetricDesc::new(
                format!("{METRIC_PREFIX}neighbors_count"),
                "Neighbor count (ARP or IPv6 ND) on interface in state",
                &["target", "name", "protocol", "state"],
            ),
        }
    }

    async fn collect_family(
        &self,
        family: &Family,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()> {
        let os = client.os_family();
        let output = client.run(family.list_command).await?;
        let interfaces = match (family.parse_list)(os, &output) {
            Ok(interfaces) => interfaces,
            Err(e) => {
                log_parse_failure(client, family.list_command, &e);
                return Ok(());
            }
        };

        for interface in interfaces {
            let output = client.run(&(family.neighbors_command)(&interface)).await?;
            let counts = match (family.parse_neighbors)(os, &output) {
                Ok(counts) => counts,
                Err(e) => {
                    log_parse_failure(client, "neighbors", &e);
                    continue;
                }
            };
            for (state, count) in counts.by_state() {
                gauge(
                    sink,
                    &self.count,
                    f64::from(count),
                    labels_with(labels, &[&interface, family.protocol, state]),
                );
            }
        }
        Ok(())
    }
}

impl Default for NeighborsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for NeighborsCollector {
    fn name(&self) -> &'static str {
        "Neighbors"
    }

    fn feature(&self) -> Feature {
        Feature::Neighbors
    }

    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![Arc::clone(&self.count)]
    }

    async fn collect(
        &self,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()> {
        for family in &FAMILIES {
            self.collect_family(family, client, sink, labels).await?;
        }
        Ok(())
    }
}

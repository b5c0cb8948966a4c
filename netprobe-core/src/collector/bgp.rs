use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectResult, Collector, flag, gauge, labels_with, log_parse_failure};
use crate::device::DeviceClient;
use crate::metrics::{MetricDesc, MetricSink};
use crate::models::Feature;
use crate::orchestrator::METRIC_PREFIX;
use crate::parsers::bgp::{SUMMARY_COMMAND, parse_sessions};

/// BGP session state and message counters
#[derive(Debug)]
pub struct BgpCollector {
    up: Arc<MetricDesc>,
    received_prefixes: Arc<MetricDesc>,
    input_messages: Arc<MetricDesc>,
    output_messages: Arc<MetricDesc>,
}

impl BgpCollector {
    /// Creates the collector and its descriptors
    #[must_use]
    pub fn new() -> Self {
        let prefix = format!("{METRIC_PREFIX}bgp_session_");
        let labels = ["target", "asn", "ip"];
        Self {
            up: MetricDesc::new(
                format!("{prefix}up"),
                "Session is up (1 = Established)",
                &labels,
            ),
            received_prefixes: MetricDesc::new(
                format!("{prefix}prefixes_received_count"),
                "Number of received prefixes",
                &labels,
            ),
            input_messages: MetricDesc::new(
                format!("{prefix}messages_input_count"),
                "Number of received messages",
                &labels,
            ),
            output_messages: MetricDesc::new(
                format!("{prefix}messages_output_count"),
                "Number of transmitted messages",
                &labels,
            ),
        }
    }
}

impl Default for BgpCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for BgpCollector {
    fn name(&self) -> &'static str {
        "BGP"
    }

    fn feature(&self) -> Feature {
        Feature::Bgp
    }

    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![
            Arc::clone(&self.up),
            Arc::clone(&self.received_prefixes),
            Arc::clone(&self.input_messages),
            Arc::clone(&self.output_messages),
        ]
    }

    async fn collect(
        &self,
        client: &mut DeviceClient<'_>,
        sink: &dyn MetricSink,
        labels: &[String],
    ) -> CollectResult<()> {
        let output = client.run(SUMMARY_COMMAND).await?;
        let sessions = match parse_sessions(client.os_family(), &output) {
            Ok(sessions) => sessions,
            Err(e) => {
                log_parse_failure(client, "bgp sessions", &e);
                return Ok(());
            }
        };

        for session in sessions {
            let l = labels_with(labels, &[&session.asn, &session.ip]);
            gauge(sink, &self.up, flag(session.up), l.clone());
            gauge(sink, &self.received_prefixes, session.received_prefixes, l.clone());
            gauge(sink, &self.input_messages, session.input_messages, l.clone());
            gauge(sink, &self.output_messages, session.output_messages, l);
        }
        Ok(())
    }
}

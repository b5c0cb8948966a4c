//! Metric descriptors, samples and sinks
//!
//! Descriptors are built once and shared by `Arc`. Collectors push
//! [`Sample`]s into a [`MetricSink`], which may be written from many target
//! tasks at once.

mod exposition;

pub use exposition::{DescriptorSet, SinkError, render_text};

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc;

/// Name, help text and label names of one metric family
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MetricDesc {
    name: String,
    help: String,
    label_names: Vec<String>,
}

impl MetricDesc {
    /// Creates a shared descriptor
    #[must_use]
    pub fn new(name: impl Into<String>, help: impl Into<String>, label_names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            help: help.into(),
            label_names: label_names.iter().map(|l| (*l).to_string()).collect(),
        })
    }

    /// Fully qualified metric name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text
    #[must_use]
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Label names in order
    #[must_use]
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }
}

/// Value semantics of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    /// Point-in-time value
    Gauge,
}

impl SampleKind {
    /// Exposition type name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
        }
    }
}

/// One observed value
#[derive(Debug, Clone)]
pub struct Sample {
    /// Family this sample belongs to
    pub desc: Arc<MetricDesc>,
    /// Value semantics
    pub kind: SampleKind,
    /// Observed value
    pub value: f64,
    /// Label values, parallel to the descriptor's label names
    pub label_values: Vec<String>,
}

impl Sample {
    /// Creates a gauge sample
    #[must_use]
    pub fn gauge(desc: &Arc<MetricDesc>, value: f64, label_values: Vec<String>) -> Self {
        debug_assert_eq!(
            desc.label_names.len(),
            label_values.len(),
            "label count mismatch for {}",
            desc.name
        );
        Self {
            desc: Arc::clone(desc),
            kind: SampleKind::Gauge,
            value,
            label_values,
        }
    }

    /// Metric name
    #[must_use]
    pub fn name(&self) -> &str {
        self.desc.name()
    }

    /// Looks up a label value by name
    #[must_use]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .label_names
            .iter()
            .position(|l| l == name)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }
}

/// Destination for samples
///
/// Implementations must accept concurrent pushes from many targets.
pub trait MetricSink: Send + Sync {
    /// Accepts a sample
    fn push(&self, sample: Sample);
}

/// Collects samples in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    samples: Mutex<Vec<Sample>>,
}

impl MemorySink {
    /// Creates an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all samples
    #[must_use]
    pub fn samples(&self) -> Vec<Sample> {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drains all samples
    #[must_use]
    pub fn take(&self) -> Vec<Sample> {
        std::mem::take(&mut *self.samples.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Samples of one metric family
    #[must_use]
    pub fn by_name(&self, name: &str) -> Vec<Sample> {
        self.samples()
            .into_iter()
            .filter(|s| s.name() == name)
            .collect()
    }

    /// Number of samples held
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no sample has been pushed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricSink for MemorySink {
    fn push(&self, sample: Sample) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sample);
    }
}

/// Forwards samples to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Sample>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Sample>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MetricSink for ChannelSink {
    fn push(&self, sample: Sample) {
        // receiver gone means nobody is scraping anymore
        let _ = self.tx.send(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup() {
        let desc = MetricDesc::new("cisco_up", "Scrape of target was successful", &["target"]);
        let sample = Sample::gauge(&desc, 1.0, vec!["r1".to_string()]);
        assert_eq!(sample.label("target"), Some("r1"));
        assert_eq!(sample.label("missing"), None);
        assert_eq!(sample.name(), "cisco_up");
    }

    #[test]
    fn test_memory_sink_filters_by_name() {
        let up = MetricDesc::new("cisco_up", "up", &["target"]);
        let other = MetricDesc::new("cisco_other", "other", &[]);
        let sink = MemorySink::new();
        sink.push(Sample::gauge(&up, 1.0, vec!["a".into()]));
        sink.push(Sample::gauge(&other, 3.0, vec![]));
        sink.push(Sample::gauge(&up, 0.0, vec!["b".into()]));

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.by_name("cisco_up").len(), 2);
        assert_eq!(sink.take().len(), 3);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let desc = MetricDesc::new("cisco_up", "up", &["target"]);
        let (sink, mut rx) = ChannelSink::new();
        sink.push(Sample::gauge(&desc, 1.0, vec!["a".into()]));
        drop(sink);
        let sample = rx.recv().await.unwrap();
        assert!((sample.value - 1.0).abs() < f64::EPSILON);
        assert!(rx.recv().await.is_none());
    }
}

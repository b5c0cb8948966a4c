//! Prometheus text exposition of collected samples

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use thiserror::Error;

use super::{MetricDesc, Sample};

/// Errors raised while registering descriptors or rendering samples
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Two different descriptors share a name
    #[error("Conflicting descriptor for metric {0}")]
    DuplicateDescriptor(String),

    /// A sample refers to a descriptor that was never registered
    #[error("Sample for unregistered metric {0}")]
    Unregistered(String),
}

/// Registered descriptors in registration order
#[derive(Debug, Default)]
pub struct DescriptorSet {
    order: Vec<Arc<MetricDesc>>,
    by_name: HashMap<String, usize>,
}

impl DescriptorSet {
    /// Creates an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor
    ///
    /// Registering an equal descriptor twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::DuplicateDescriptor` when a different descriptor already uses
    /// the same name.
    pub fn register(&mut self, desc: &Arc<MetricDesc>) -> Result<(), SinkError> {
        if let Some(&index) = self.by_name.get(desc.name()) {
            if *self.order[index] == **desc {
                return Ok(());
            }
            return Err(SinkError::DuplicateDescriptor(desc.name().to_string()));
        }
        self.by_name.insert(desc.name().to_string(), self.order.len());
        self.order.push(Arc::clone(desc));
        Ok(())
    }

    /// Registers every descriptor
    ///
    /// # Errors
    ///
    /// Stops at the first conflict.
    pub fn register_all<'a>(
        &mut self,
        descs: impl IntoIterator<Item = &'a Arc<MetricDesc>>,
    ) -> Result<(), SinkError> {
        descs.into_iter().try_for_each(|d| self.register(d))
    }

    /// Registered descriptors in order
    #[must_use]
    pub fn descriptors(&self) -> &[Arc<MetricDesc>] {
        &self.order
    }

    /// Number of registered descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        value.to_string()
    }
}

/// Renders samples in Prometheus text format
///
/// Families appear in registration order, samples within a family in push
/// order. Families without samples are omitted.
///
/// # Errors
///
/// Returns `SinkError::Unregistered` for a sample whose family is not in
/// `descriptors`.
pub fn render_text(descriptors: &DescriptorSet, samples: &[Sample]) -> Result<String, SinkError> {
    let mut grouped: Vec<Vec<&Sample>> = vec![Vec::new(); descriptors.len()];
    for sample in samples {
        let index = descriptors
            .by_name
            .get(sample.name())
            .copied()
            .ok_or_else(|| SinkError::Unregistered(sample.name().to_string()))?;
        grouped[index].push(sample);
    }

    let mut out = String::new();
    for (desc, family) in descriptors.order.iter().zip(&grouped) {
        let Some(first) = family.first() else {
            continue;
        };
        let _ = writeln!(out, "# HELP {} {}", desc.name(), desc.help());
        let _ = writeln!(out, "# TYPE {} {}", desc.name(), first.kind.as_str());
        for sample in family {
            out.push_str(desc.name());
            if !desc.label_names().is_empty() {
                let labels: Vec<String> = desc
                    .label_names()
                    .iter()
                    .zip(&sample.label_values)
                    .map(|(name, value)| format!("{name}=\"{}\"", escape_label_value(value)))
                    .collect();
                let _ = write!(out, "{{{}}}", labels.join(","));
            }
            let _ = writeln!(out, " {}", format_value(sample.value));
        }
    }
    Ok(out)
}

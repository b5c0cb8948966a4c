//! One-shot collection cycle.

use std::sync::Arc;

use netprobe_core::{
    CollectorRegistry, Config, DescriptorSet, MemorySink, Orchestrator, ScrapeSummary,
    SshConnector, SshProfile, render_text,
};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Scrape command handler
pub fn cmd_scrape(config: &Config, format: OutputFormat) -> Result<(), CliError> {
    let targets = config.resolve_targets()?;
    let connector = Arc::new(SshConnector::new(SshProfile::new(), config.prompt_matcher()?));
    let registry = CollectorRegistry::for_targets(&targets);
    let orchestrator = Orchestrator::new(targets, registry, connector).with_debug(config.debug);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Runtime(format!("Failed to create async runtime: {e}")))?;
    let sink = Arc::new(MemorySink::new());
    let summary = runtime.block_on(orchestrator.collect_all(sink.clone()));

    match format {
        OutputFormat::Text => {
            let mut descriptors = DescriptorSet::new();
            descriptors.register_all(orchestrator.describe().iter())?;
            print!("{}", render_text(&descriptors, &sink.take())?);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    report_failures(&summary);
    if summary.all_failed() {
        return Err(CliError::AllTargetsFailed {
            total: summary.total,
        });
    }
    Ok(())
}

fn report_failures(summary: &ScrapeSummary) {
    for report in &summary.reports {
        if let Some(error) = &report.error {
            tracing::warn!(target_host = %report.target, %error, "Target aborted");
        }
        for failure in &report.collector_failures {
            tracing::warn!(
                target_host = %report.target,
                collector = failure.collector,
                error = %failure.error,
                "Collector failed"
            );
        }
    }
}

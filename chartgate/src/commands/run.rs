use super::helpers::{humanize_duration, print_json};
use crate::ReportFormat;
use anyhow::Result;
use chartgate_common::discovery::discover_charts;
use chartgate_common::{
    GateConfig, GateError, HelmRenderer, KubeconformValidator, MatrixRunner, TokioCommandRunner,
};
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;

/// Discover, render, validate and print the summary.
pub async fn run(config: &GateConfig, format: ReportFormat) -> Result<ExitCode> {
    let started = Instant::now();
    let root = &config.charts_directory.value;
    info!(charts_directory = %root.display(), "discovering charts");
    let discovery = discover_charts(root, &config.discovery_options()).map_err(GateError::from)?;
    info!(
        charts = discovery.charts.len(),
        cases = discovery.case_count(),
        "discovery finished"
    );

    let runner = MatrixRunner::new(
        HelmRenderer::new(TokioCommandRunner, config.render_options()),
        KubeconformValidator::new(
            TokioCommandRunner,
            config.kubeconform.value.clone(),
            config.subprocess_timeout.value,
        ),
        config.run_options(),
    );
    let report = runner.run_discovery(&discovery).await;

    match format {
        ReportFormat::Text => print!("{}", report.to_text()),
        ReportFormat::Json => print_json(&report)?,
    }
    info!(
        success = report.success(),
        elapsed = %humanize_duration(started.elapsed()),
        "run complete"
    );
    Ok(ExitCode::from(report.exit_code()))
}

//! Test matrix runner.
//!
//! Drives every (chart, values file) case through render and validation, one
//! case at a time, recording exactly one outcome per case. A failing case
//! never stops the run.

use crate::discovery::Discovery;
use crate::render::ManifestRenderer;
use crate::report::{Aggregator, OutcomeStatus, Report, ValidationOutcome};
use crate::types::TestCase;
use crate::validate::{Diagnostics, ManifestValidator, ValidateOptions};
use std::fmt;
use tracing::{Instrument, debug, error, info, info_span};

/// Lifecycle of a single case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStage {
    Discovered,
    Rendering,
    Validating,
    Recorded,
    Failed,
}

impl fmt::Display for CaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discovered => "discovered",
            Self::Rendering => "rendering",
            Self::Validating => "validating",
            Self::Recorded => "recorded",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Per-run settings shared by every case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOptions {
    /// Run `helm dependency build` before each render.
    pub refresh_dependencies: bool,
    pub validate: ValidateOptions,
}

pub struct MatrixRunner<Rd, V> {
    renderer: Rd,
    validator: V,
    options: RunOptions,
}

impl<Rd, V> MatrixRunner<Rd, V>
where
    Rd: ManifestRenderer,
    V: ManifestValidator,
{
    pub fn new(renderer: Rd, validator: V, options: RunOptions) -> Self {
        Self {
            renderer,
            validator,
            options,
        }
    }

    pub fn renderer(&self) -> &Rd {
        &self.renderer
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Run every case of `discovery`; its issues are carried into the report.
    pub async fn run_discovery(&self, discovery: &Discovery) -> Report {
        let mut aggregator = Aggregator::new();
        aggregator.record_issues(discovery.issues.iter().cloned());
        self.run_into(&discovery.test_cases(), aggregator).await
    }

    /// Run `cases` in order.
    pub async fn run_all(&self, cases: &[TestCase]) -> Report {
        self.run_into(cases, Aggregator::new()).await
    }

    async fn run_into(&self, cases: &[TestCase], mut aggregator: Aggregator) -> Report {
        info!(cases = cases.len(), "starting test matrix");
        for case in cases {
            let span = info_span!("case", chart = %case.chart.name, values = %case.values_file);
            let outcome = self.run_case(case).instrument(span).await;
            aggregator.record(outcome);
        }
        let report = aggregator.finish();
        info!(
            passed = report.passed_count(),
            failed = report.failed_count(),
            "test matrix finished"
        );
        report
    }

    /// Render and validate one case. Never fails; errors become the outcome.
    pub async fn run_case(&self, case: &TestCase) -> ValidationOutcome {
        debug!(stage = %CaseStage::Discovered, path = %case.values_path.display(), "queued");

        info!(stage = %CaseStage::Rendering, "rendering chart");
        let manifest = match self
            .renderer
            .render(case, self.options.refresh_dependencies)
            .await
        {
            Ok(manifest) => manifest,
            Err(err) => {
                error!(stage = %CaseStage::Failed, error = %err, "render failed");
                return ValidationOutcome::new(
                    case,
                    OutcomeStatus::RenderFailed,
                    None,
                    Diagnostics::Raw(err.to_string()),
                );
            }
        };

        info!(stage = %CaseStage::Validating, bytes = manifest.len(), "validating manifests");
        let output = match self.validator.validate(manifest, &self.options.validate).await {
            Ok(output) => output,
            Err(err) => {
                error!(stage = %CaseStage::Failed, error = %err, "validator failed");
                return ValidationOutcome::new(
                    case,
                    OutcomeStatus::ValidatorFailed,
                    None,
                    Diagnostics::Raw(err.to_string()),
                );
            }
        };

        let stage = if output.success {
            CaseStage::Recorded
        } else {
            CaseStage::Failed
        };
        match (&output.diagnostics, output.success) {
            (Diagnostics::Structured(value), true) => {
                info!(stage = %stage, diagnostics = %value, "manifests valid")
            }
            (Diagnostics::Raw(text), true) => info!(stage = %stage, output = %text, "manifests valid"),
            (Diagnostics::Structured(value), false) => {
                error!(stage = %stage, exit_code = ?output.exit_code, diagnostics = %value, "manifests invalid")
            }
            (Diagnostics::Raw(text), false) => {
                error!(stage = %stage, exit_code = ?output.exit_code, output = %text, "manifests invalid")
            }
        }

        let status = if output.success {
            OutcomeStatus::Passed
        } else {
            OutcomeStatus::Invalid
        };
        ValidationOutcome::new(case, status, output.exit_code, output.diagnostics)
    }
}

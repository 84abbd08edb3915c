//! Result aggregation and summary rendering.

use crate::discovery::DiscoveryIssue;
use crate::types::TestCase;
use crate::validate::Diagnostics;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::warn;

/// Exit status for a run where every case passed.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status for a run with at least one failing case.
pub const EXIT_FAILURES: u8 = 1;

/// Final state of one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Passed,
    /// Dependency refresh or templating failed; validation never ran.
    RenderFailed,
    /// The validator ran and rejected the manifests.
    Invalid,
    /// The validator could not be run to completion.
    ValidatorFailed,
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Passed)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::RenderFailed => "render failed",
            Self::Invalid => "invalid",
            Self::ValidatorFailed => "validator failed",
        }
    }
}

/// Outcome of one (chart, values file) case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub chart: String,
    pub chart_dir: PathBuf,
    pub values_file: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub diagnostics: Diagnostics,
}

impl ValidationOutcome {
    pub fn new(case: &TestCase, status: OutcomeStatus, exit_code: Option<i32>, diagnostics: Diagnostics) -> Self {
        Self {
            chart: case.chart.name.clone(),
            chart_dir: case.chart.dir.clone(),
            values_file: case.values_file.to_string(),
            status,
            exit_code,
            diagnostics,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.chart, self.values_file)
    }
}

/// Ordered outcomes of a run plus non-fatal discovery issues.
///
/// Holds no timestamps or durations: the same inputs always produce the
/// same report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    outcomes: Vec<ValidationOutcome>,
    discovery_issues: Vec<DiscoveryIssue>,
}

impl Report {
    pub fn outcomes(&self) -> &[ValidationOutcome] {
        &self.outcomes
    }

    pub fn discovery_issues(&self) -> &[DiscoveryIssue] {
        &self.discovery_issues
    }

    /// True iff no outcome failed. An empty report counts as success.
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(ValidationOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn exit_code(&self) -> u8 {
        if self.success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURES
        }
    }

    /// Human-readable summary; every failing case lists its diagnostics.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            if outcome.is_success() {
                let _ = writeln!(out, "PASS  {}", outcome.label());
                continue;
            }
            let exit = outcome
                .exit_code
                .map(|code| format!(", exit {code}"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "FAIL  {} ({}{})",
                outcome.label(),
                outcome.status.label(),
                exit
            );
            let text = outcome.diagnostics.to_text();
            if !text.trim().is_empty() {
                let _ = writeln!(out, "{}", indent_lines(text.trim_end(), "      "));
            }
        }
        for issue in &self.discovery_issues {
            let _ = writeln!(out, "WARN  {}", issue.message);
        }
        if self.outcomes.is_empty() {
            let _ = writeln!(out, "no test cases were found");
        } else {
            let _ = writeln!(
                out,
                "{} test case(s): {} passed, {} failed",
                self.outcomes.len(),
                self.passed_count(),
                self.failed_count()
            );
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Collects outcomes in scheduling order.
#[derive(Debug, Default)]
pub struct Aggregator {
    report: Report,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: ValidationOutcome) {
        self.report.outcomes.push(outcome);
    }

    pub fn record_issues(&mut self, issues: impl IntoIterator<Item = DiscoveryIssue>) {
        self.report.discovery_issues.extend(issues);
    }

    pub fn len(&self) -> usize {
        self.report.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.report.outcomes.is_empty()
    }

    /// Seal the report.
    pub fn finish(self) -> Report {
        if self.report.outcomes.is_empty() {
            warn!("no test cases were run; check the charts directory and fixture layout");
        }
        self.report
    }
}

/// Indent each line of text with a given prefix.
pub fn indent_lines(text: &str, prefix: &str) -> String {
    let mut out = String::new();
    for (idx, line) in text.lines().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(prefix);
        out.push_str(line);
    }
    out
}

use super::helpers::print_json;
use crate::ReportFormat;
use anyhow::Result;
use chartgate_common::{GateConfig, GateError};
use chartgate_common::discovery::{DiscoveryIssue, discover_charts};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Serialize)]
struct ListedCase {
    chart: String,
    values_file: String,
    values_path: PathBuf,
}

#[derive(Serialize)]
struct Listing<'a> {
    cases: Vec<ListedCase>,
    issues: &'a [DiscoveryIssue],
}

/// Print the test matrix without running any subprocess.
pub fn list(config: &GateConfig, format: ReportFormat) -> Result<ExitCode> {
    let discovery = discover_charts(&config.charts_directory.value, &config.discovery_options())
        .map_err(GateError::from)?;
    let cases: Vec<ListedCase> = discovery
        .test_cases()
        .into_iter()
        .map(|case| ListedCase {
            chart: case.chart.name,
            values_file: case.values_file.0,
            values_path: case.values_path,
        })
        .collect();

    match format {
        ReportFormat::Json => print_json(&Listing {
            cases,
            issues: &discovery.issues,
        })?,
        ReportFormat::Text => {
            for case in &cases {
                println!(
                    "{}/{}  {}",
                    case.chart,
                    case.values_file,
                    case.values_path.display()
                );
            }
            for issue in &discovery.issues {
                println!("WARN  {}", issue.message);
            }
            println!(
                "{} test case(s) in {} chart(s)",
                cases.len(),
                discovery.charts.len()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

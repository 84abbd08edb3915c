use super::helpers::{column_width, print_json};
use crate::ReportFormat;
use anyhow::Result;
use chartgate_common::GateConfig;
use std::process::ExitCode;

pub fn show_config(config: &GateConfig, format: ReportFormat) -> Result<ExitCode> {
    let rows = config.describe();
    match format {
        ReportFormat::Json => print_json(&rows)?,
        ReportFormat::Text => {
            let name_width = column_width(rows.iter().map(|r| r.name));
            let value_width = column_width(rows.iter().map(|r| r.value.as_str()));
            for row in &rows {
                println!(
                    "{:<name_width$}  {:<value_width$}  ({})",
                    row.name, row.value, row.origin
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

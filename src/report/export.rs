//! JSON export of a pipeline run summary

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use super::summary::PipelineSummary;

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the export (ISO 8601 format)
    pub timestamp: String,
    /// tabprep version
    pub tabprep_version: String,
    /// Input file path
    pub input_file: String,
    /// Output file path, if the dataset was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

/// Complete run export with metadata
#[derive(Serialize)]
pub struct RunExport<'a> {
    pub metadata: RunMetadata,
    pub summary: &'a PipelineSummary,
}

impl<'a> RunExport<'a> {
    pub fn new(summary: &'a PipelineSummary, input: &Path, output: Option<&Path>) -> Self {
        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                tabprep_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: input.display().to_string(),
                output_file: output.map(|p| p.display().to_string()),
            },
            summary,
        }
    }
}

/// Write the run summary as pretty-printed JSON
pub fn export_summary(
    summary: &PipelineSummary,
    input: &Path,
    output: Option<&Path>,
    report_path: &Path,
) -> Result<()> {
    let export = RunExport::new(summary, input, output);
    let json = serde_json::to_string_pretty(&export).context("Failed to serialize run summary")?;
    std::fs::write(report_path, json)
        .with_context(|| format!("Failed to write report file: {}", report_path.display()))?;
    Ok(())
}

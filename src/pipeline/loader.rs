//! Dataset loader for CSV and Parquet files

use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use super::config::DEFAULT_INFER_SCHEMA_LENGTH;
use super::dataset::Dataset;
use super::error::{PipelineError, Result};

/// Options controlling how a file is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Rows used for CSV dtype inference. 0 means full table scan.
    pub infer_schema_length: usize,
    /// Extra CSV token treated as missing, besides empty fields.
    pub missing_marker: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            infer_schema_length: DEFAULT_INFER_SCHEMA_LENGTH,
            missing_marker: None,
        }
    }
}

/// Load a dataset from a file (CSV or Parquet based on extension).
///
/// Column kinds are detected here once and carried by the returned
/// [`Dataset`] through every later stage.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    if !path.is_file() {
        return Err(access_error(path, "file does not exist or is not a regular file"));
    }

    let frame = scan_dataset(path, options)?
        .collect()
        .map_err(|e| access_error(path, e))?;

    let (rows, cols) = frame.shape();
    info!(path = %path.display(), rows, cols, "Dataset loaded");

    let dataset = Dataset::from_frame(frame)?;
    for spec in dataset.schema() {
        debug!(column = %spec.name, kind = %spec.kind, "Detected column kind");
    }
    Ok(dataset)
}

/// Read only the column names of a file (cheap schema scan).
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    let mut lf = scan_dataset(path, &LoadOptions::default())?;
    let schema = lf.collect_schema().map_err(|e| access_error(path, e))?;
    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

fn scan_dataset(path: &Path, options: &LoadOptions) -> Result<LazyFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            // 0 means full scan
            let schema_length = if options.infer_schema_length == 0 {
                None
            } else {
                Some(options.infer_schema_length)
            };

            let mut reader = LazyCsvReader::new(path).with_infer_schema_length(schema_length);
            if let Some(marker) = &options.missing_marker {
                reader = reader.with_null_values(Some(NullValues::AllColumnsSingle(
                    marker.as_str().into(),
                )));
            }
            reader.finish().map_err(|e| access_error(path, e))
        }
        "parquet" => LazyFrame::scan_parquet(path, Default::default()).map_err(|e| access_error(path, e)),
        _ => Err(access_error(
            path,
            format!(
                "unsupported file format '{}'. Supported formats: csv, parquet",
                extension
            ),
        )),
    }
}

fn access_error(path: &Path, reason: impl ToString) -> PipelineError {
    PipelineError::DataAccess {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

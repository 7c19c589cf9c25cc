//! Command-line argument definitions using clap

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::pipeline::{PipelineConfig, Result, ScalingMethod};

/// tabprep - Impute, balance, discretize, select, reduce and scale a tabular dataset
#[derive(Parser, Debug)]
#[command(name = "tabprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Target column name (guides balancing and feature selection).
    /// Required unless provided by --config.
    #[arg(short, long)]
    pub target: Option<String>,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to input directory with '_prepared' suffix (e.g., data.csv → data_prepared.csv).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON configuration file. Explicit flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of equal-width bins for discretization
    #[arg(long)]
    pub bins: Option<usize>,

    /// Number of principal components (clamped to the selected feature count)
    #[arg(long)]
    pub n_components: Option<usize>,

    /// Scaling method applied after reduction.
    /// Options: "standard" (zero mean, unit variance) or "normalization" (min-max into [0, 1])
    #[arg(long, value_parser = parse_scaling_method)]
    pub scaling_method: Option<ScalingMethod>,

    /// Seed for minority-class resampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Extra token treated as missing in CSV input (empty fields are always missing)
    #[arg(long)]
    pub missing_marker: Option<String>,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long)]
    pub infer_schema_length: Option<usize>,

    /// Write a JSON report of the run to this path
    #[arg(short = 'r', long)]
    pub report: Option<PathBuf>,

    /// Log level for library diagnostics (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Only show errors
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Cli {
    /// Get the output path, deriving from input if not explicitly provided.
    /// The derived path will be in the same directory as the input with a '_prepared' suffix.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derive_output_path(&self.input))
    }

    /// Build the pipeline configuration: defaults, then the config file, then flags.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(target) = &self.target {
            config.target_column = target.clone();
        }
        if let Some(bins) = self.bins {
            config.bins = bins;
        }
        if let Some(n) = self.n_components {
            config.n_components = n;
        }
        if let Some(method) = self.scaling_method {
            config.scaling_method = method;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(marker) = &self.missing_marker {
            config.missing_marker = Some(marker.clone());
        }
        if let Some(rows) = self.infer_schema_length {
            config.infer_schema_length = rows;
        }

        config.validate()?;
        Ok(config)
    }
}

fn derive_output_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv");
    parent.join(format!("{}_prepared.{}", stem, extension))
}

/// Validator for scaling_method parameter
fn parse_scaling_method(s: &str) -> std::result::Result<ScalingMethod, String> {
    s.parse().map_err(|e: crate::pipeline::PipelineError| e.to_string())
}

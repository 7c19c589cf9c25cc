//! tabprep: Tabular Preprocessing CLI Tool
//!
//! Runs the full preprocessing pipeline on a CSV or Parquet file and writes
//! the transformed table next to it.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use polars::prelude::*;

use tabprep::cli::Cli;
use tabprep::pipeline::{run_pipeline_with_summary, Stage, StageObserver};
use tabprep::report::{export_summary, StageRecord};
use tabprep::utils::{
    create_spinner, finish_with_failure, finish_with_success, print_banner, print_completion,
    print_config, print_info, print_step_header, print_step_time, print_success,
};

/// Prints a step header and spinner for every pipeline stage
struct ConsoleObserver {
    quiet: bool,
    step: usize,
    spinner: Option<ProgressBar>,
}

impl ConsoleObserver {
    fn new(quiet: bool) -> Self {
        Self {
            quiet,
            step: 0,
            spinner: None,
        }
    }

    fn fail(&mut self) {
        if let Some(pb) = self.spinner.take() {
            finish_with_failure(&pb, "Stage failed");
        }
    }
}

impl StageObserver for ConsoleObserver {
    fn on_stage_start(&mut self, stage: Stage) {
        if self.quiet {
            return;
        }
        self.step += 1;
        print_step_header(self.step, stage.title());
        self.spinner = Some(create_spinner(&format!("Running {} stage...", stage)));
    }

    fn on_stage_complete(&mut self, record: &StageRecord) {
        if let Some(pb) = self.spinner.take() {
            finish_with_success(
                &pb,
                &format!("{} rows × {} columns", record.rows, record.columns),
            );
        }
        if !self.quiet {
            print_step_time(record.elapsed);
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so they never interleave with a piped output file.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "error" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet);

    let config = cli
        .pipeline_config()
        .context("Invalid pipeline configuration")?;
    let output_path = cli.output_path();

    if !cli.quiet {
        print_banner(env!("CARGO_PKG_VERSION"));
        print_config(&cli.input, &output_path, &config);
    }

    let mut observer = ConsoleObserver::new(cli.quiet);
    let (dataset, summary) = match run_pipeline_with_summary(&cli.input, &config, &mut observer) {
        Ok(result) => result,
        Err(e) => {
            observer.fail();
            return Err(e).context("Pipeline aborted");
        }
    };

    let spinner = (!cli.quiet).then(|| create_spinner("Writing output file..."));
    let mut frame = dataset.into_frame();
    save_dataset(&mut frame, &output_path)?;
    if let Some(pb) = spinner {
        finish_with_success(&pb, &format!("Saved to {}", output_path.display()));
    }

    if let Some(report_path) = &cli.report {
        export_summary(&summary, &cli.input, Some(&output_path), report_path)?;
        if !cli.quiet {
            print_success(&format!("Report written to {}", report_path.display()));
        }
    }

    if !cli.quiet {
        if summary.selected_features().is_empty() {
            print_info("No features were selected");
        }
        summary.display();
        print_completion();
    }

    Ok(())
}

/// Save dataset to file (CSV or Parquet based on extension)
fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}

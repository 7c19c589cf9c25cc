//! Pipeline orchestration
//!
//! Stages run strictly in order:
//! `Load → Impute → Balance → Discretize → Select → Reduce → Scale → Combine`.
//! Each consumes the previous stage's complete output; any error aborts the
//! run and nothing partial is returned. The target column is held aside
//! around the feature-only stages (Reduce, Scale) and joined back by row key.

use std::path::Path;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::balance::{balance_classes, class_counts, split_classes};
use super::config::PipelineConfig;
use super::dataset::Dataset;
use super::discretize::discretize;
use super::error::{Result, Stage};
use super::impute::impute_missing;
use super::loader::load_dataset;
use super::reduce::reduce_dimensions;
use super::scale::scale;
use super::select::select_features;
use crate::report::{PipelineSummary, StageRecord};

/// Hooks called around every stage. Both default to doing nothing.
pub trait StageObserver {
    fn on_stage_start(&mut self, _stage: Stage) {}
    fn on_stage_complete(&mut self, _record: &StageRecord) {}
}

impl StageObserver for () {}

/// Load `path` and run every stage, returning only the final dataset.
pub fn run_pipeline(path: &Path, config: &PipelineConfig) -> Result<Dataset> {
    run_pipeline_with_summary(path, config, &mut ()).map(|(dataset, _)| dataset)
}

/// Load `path` and run every stage, reporting progress to `observer`.
///
/// The configuration is validated before the file is read, and the target
/// column is checked right after loading, before any transformation.
pub fn run_pipeline_with_summary<O: StageObserver + ?Sized>(
    path: &Path,
    config: &PipelineConfig,
    observer: &mut O,
) -> Result<(Dataset, PipelineSummary)> {
    config.validate()?;
    let mut summary = PipelineSummary::new(config);

    let options = config.load_options();
    let dataset = run_stage(Stage::Load, observer, &mut summary, || {
        load_dataset(path, &options)
    })?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    run_stages(dataset, config, &mut rng, observer, summary)
}

/// Run every stage after Load on an in-memory dataset.
///
/// `rng` drives class-balancing resampling; pass a seeded source for
/// reproducible output.
pub fn transform_dataset<R, O>(
    dataset: Dataset,
    config: &PipelineConfig,
    rng: &mut R,
    observer: &mut O,
) -> Result<(Dataset, PipelineSummary)>
where
    R: Rng + ?Sized,
    O: StageObserver + ?Sized,
{
    config.validate()?;
    let summary = PipelineSummary::new(config);
    run_stages(dataset, config, rng, observer, summary)
}

fn run_stages<R, O>(
    dataset: Dataset,
    config: &PipelineConfig,
    rng: &mut R,
    observer: &mut O,
    mut summary: PipelineSummary,
) -> Result<(Dataset, PipelineSummary)>
where
    R: Rng + ?Sized,
    O: StageObserver + ?Sized,
{
    let target = config.target_column.as_str();

    // Fail before any transformation if the label is absent
    dataset.require(target, Stage::Load)?;

    let imputed = run_stage(Stage::Impute, observer, &mut summary, || {
        impute_missing(&dataset)
    })?;
    drop(dataset);

    summary.class_counts_before = class_counts(&imputed, target)?;
    summary.majority_label = split_classes(&imputed, target)?.majority_label;
    let balanced = run_stage(Stage::Balance, observer, &mut summary, || {
        balance_classes(&imputed, target, rng)
    })?;
    drop(imputed);
    summary.class_counts_after = class_counts(&balanced, target)?;

    // Every numeric column except the label is binned
    let to_bin: Vec<String> = balanced
        .partition()
        .numeric
        .into_iter()
        .filter(|name| name != target)
        .collect();
    let discretized = run_stage(Stage::Discretize, observer, &mut summary, || {
        discretize(&balanced, &to_bin, config.bins)
    })?;
    drop(balanced);
    summary.discretized_columns = to_bin;

    let mut scores = Vec::new();
    let selected = run_stage(Stage::Select, observer, &mut summary, || {
        let selection = select_features(&discretized, target)?;
        scores = selection.scores;
        Ok(selection.dataset)
    })?;
    drop(discretized);
    summary.feature_scores = scores;

    let (features, target_column) = selected.split_target(target, Stage::Reduce)?;
    let mut components = Vec::new();
    let reduced = run_stage(Stage::Reduce, observer, &mut summary, || {
        let projection = reduce_dimensions(&features, config.n_components)?;
        components = projection.components;
        projection.dataset.attach_target(&target_column, Stage::Reduce)
    })?;
    drop(features);
    summary.components = components;

    let (features, target_column) = reduced.split_target(target, Stage::Scale)?;
    let scaled = run_stage(Stage::Scale, observer, &mut summary, || {
        scale(&features, config.scaling_method)
    })?;

    let output = run_stage(Stage::Combine, observer, &mut summary, || {
        scaled.attach_target(&target_column, Stage::Combine)
    })?;
    summary.output_columns = output.column_names();

    info!(
        rows = output.height(),
        columns = output.width(),
        "Pipeline complete"
    );
    Ok((output, summary))
}

fn run_stage<O, F>(
    stage: Stage,
    observer: &mut O,
    summary: &mut PipelineSummary,
    f: F,
) -> Result<Dataset>
where
    O: StageObserver + ?Sized,
    F: FnOnce() -> Result<Dataset>,
{
    observer.on_stage_start(stage);
    let start = Instant::now();
    let dataset = f()?;

    let record = StageRecord {
        stage,
        rows: dataset.height(),
        columns: dataset.width(),
        elapsed: start.elapsed(),
    };
    info!(
        stage = %stage,
        rows = record.rows,
        columns = record.columns,
        "Stage complete"
    );
    observer.on_stage_complete(&record);
    summary.record(record);
    Ok(dataset)
}

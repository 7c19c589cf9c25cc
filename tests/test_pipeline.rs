//! End-to-end tests for the full preprocessing pipeline

#[path = "common/mod.rs"]
mod common;

use common::*;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tabprep::pipeline::{
    run_pipeline, run_pipeline_with_summary, transform_dataset, PipelineConfig, PipelineError,
    ScalingMethod, Stage, StageObserver,
};
use tabprep::report::{export_summary, StageRecord};

fn config() -> PipelineConfig {
    PipelineConfig::builder()
        .target_column("target")
        .build()
        .unwrap()
}

/// Records the order stages start and finish in
#[derive(Default)]
struct Recorder {
    started: Vec<Stage>,
    completed: Vec<Stage>,
}

impl StageObserver for Recorder {
    fn on_stage_start(&mut self, stage: Stage) {
        self.started.push(stage);
    }

    fn on_stage_complete(&mut self, record: &StageRecord) {
        self.completed.push(record.stage);
    }
}

#[test]
fn test_end_to_end_reference_scenario() {
    let mut df = create_reference_dataframe();
    let (_dir, path) = create_temp_csv(&mut df);

    let output = run_pipeline(&path, &config()).unwrap();

    assert_shape(&output, 160, 3);
    assert_eq!(output.column_names(), vec!["PC1", "PC2", "target"]);

    for name in ["PC1", "PC2"] {
        let (mean, std) = mean_std(&values(&output, name));
        assert!(mean.abs() < 1e-9, "{} mean {}", name, mean);
        assert!((std - 1.0).abs() < 1e-9, "{} std {}", name, std);
    }

    let labels = output.text_values("target").unwrap();
    assert_eq!(labels.iter().filter(|l| l.as_deref() == Some("A")).count(), 80);
    assert_eq!(labels.iter().filter(|l| l.as_deref() == Some("B")).count(), 80);
}

#[test]
fn test_summary_tracks_every_stage() {
    let mut df = create_reference_dataframe();
    let (_dir, path) = create_temp_parquet(&mut df);
    let mut recorder = Recorder::default();

    let (_, summary) = run_pipeline_with_summary(&path, &config(), &mut recorder).unwrap();

    assert_eq!(recorder.started, Stage::ALL.to_vec());
    assert_eq!(recorder.completed, Stage::ALL.to_vec());
    assert_eq!(summary.stages.len(), Stage::ALL.len());

    assert_eq!(summary.majority_label.as_deref(), Some("A"));
    assert_eq!(count_of(&summary.class_counts_before, "B"), 20);
    assert_eq!(count_of(&summary.class_counts_after, "B"), 80);
    assert_eq!(summary.discretized_columns.len(), 12);
    assert_eq!(summary.selected_features().len(), 10);
    assert_eq!(summary.components.len(), 2);
    assert_eq!(summary.output_columns, vec!["PC1", "PC2", "target"]);

    let balance = summary.stage(Stage::Balance).unwrap();
    assert_eq!((balance.rows, balance.columns), (160, 13));
    let select = summary.stage(Stage::Select).unwrap();
    assert_eq!(select.columns, 11);
}

#[test]
fn test_integer_target_is_returned_unchanged() {
    let mut df = create_reference_dataframe();
    let labels: Vec<i64> = (0..100).map(|r| if r < 80 { 0 } else { 1 }).collect();
    df.with_column(Column::new("target".into(), labels)).unwrap();
    let (_dir, path) = create_temp_csv(&mut df);

    let (output, summary) = run_pipeline_with_summary(&path, &config(), &mut ()).unwrap();

    assert_eq!(output.column_names(), vec!["PC1", "PC2", "target"]);
    let target = output.frame().column("target").unwrap();
    assert_eq!(target.dtype(), &DataType::Int64);

    let values: Vec<Option<i64>> = target.i64().unwrap().into_iter().collect();
    assert_eq!(values.len(), 160);
    assert!(values[..80].iter().all(|v| *v == Some(0)));
    assert!(values[80..].iter().all(|v| *v == Some(1)));

    assert_eq!(summary.majority_label.as_deref(), Some("0"));
    assert_eq!(count_of(&summary.class_counts_before, "1"), 20);
    assert_eq!(count_of(&summary.class_counts_after, "1"), 80);
}

#[test]
fn test_missing_target_fails_before_any_transformation() {
    let mut df = create_reference_dataframe();
    let (_dir, path) = create_temp_csv(&mut df);
    let config = PipelineConfig::builder()
        .target_column("label")
        .build()
        .unwrap();
    let mut recorder = Recorder::default();

    let result = run_pipeline_with_summary(&path, &config, &mut recorder);

    match result {
        Err(PipelineError::MissingColumn { column, .. }) => assert_eq!(column, "label"),
        other => panic!("expected MissingColumn, got ok={}", other.is_ok()),
    }
    assert_eq!(recorder.started, vec![Stage::Load]);
}

#[test]
fn test_invalid_scaling_method_rejected() {
    let built = PipelineConfig::builder()
        .target_column("target")
        .scaling_method_name("bogus")
        .build();
    assert!(matches!(built, Err(PipelineError::InvalidConfig { .. })));

    let parsed = PipelineConfig::from_json_str(r#"{"target_column": "target", "scaling_method": "bogus"}"#);
    assert!(matches!(parsed, Err(PipelineError::InvalidConfig { .. })));
}

#[test]
fn test_unreadable_input_is_data_access_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let result = run_pipeline(&dir.path().join("missing.csv"), &config());
    assert!(matches!(result, Err(PipelineError::DataAccess { .. })));
}

#[test]
fn test_same_seed_same_output() {
    let mut df = create_reference_dataframe();
    let (_dir, path) = create_temp_csv(&mut df);

    let first = run_pipeline(&path, &config()).unwrap();
    let second = run_pipeline(&path, &config()).unwrap();
    assert_eq!(first, second);

    let reseeded = PipelineConfig::builder()
        .target_column("target")
        .seed(7)
        .build()
        .unwrap();
    let third = run_pipeline(&path, &reseeded).unwrap();
    assert_ne!(first, third);
}

#[test]
fn test_in_memory_with_gaps_and_categorical_feature() {
    let mut df = create_classification_dataframe(30, 10, 4, 11);
    let mut gappy: Vec<Option<f64>> = df
        .column("feature_1")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    gappy[3] = None;
    gappy[35] = None;
    df.with_column(Column::new("feature_1".into(), gappy)).unwrap();
    let colour: Vec<&str> = (0..40).map(|i| if i % 3 == 0 { "red" } else { "blue" }).collect();
    df.with_column(Column::new("colour".into(), colour)).unwrap();

    let config = PipelineConfig::builder()
        .target_column("target")
        .n_components(3)
        .scaling_method(ScalingMethod::Normalization)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    let (output, summary) = transform_dataset(dataset(df), &config, &mut rng, &mut ()).unwrap();

    assert_shape(&output, 60, 4);
    assert_eq!(output.column_names(), vec!["PC1", "PC2", "PC3", "target"]);
    assert_eq!(summary.feature_scores.len(), 4);
    for name in ["PC1", "PC2", "PC3"] {
        let pc = values(&output, name);
        assert_eq!(pc.len(), 60);
        assert!(pc.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn test_single_class_target_is_imbalance_error() {
    let df = df! {
        "x" => [1.0f64, 2.0, 3.0, 4.0],
        "target" => ["a", "a", "a", "a"],
    }
    .unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    let result = transform_dataset(dataset(df), &config(), &mut rng, &mut ());
    assert!(matches!(result, Err(PipelineError::Imbalance { .. })));
}

#[test]
fn test_export_summary_writes_json() {
    let mut df = create_reference_dataframe();
    let (dir, path) = create_temp_csv(&mut df);
    let (_, summary) = run_pipeline_with_summary(&path, &config(), &mut ()).unwrap();

    let report = dir.path().join("report.json");
    export_summary(&summary, &path, None, &report).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["summary"]["target_column"], "target");
    assert_eq!(json["summary"]["scaling_method"], "standard");
    assert_eq!(json["summary"]["stages"].as_array().unwrap().len(), 8);
    assert_eq!(json["summary"]["stages"][0]["stage"], "load");
    assert!(json["metadata"]["timestamp"].is_string());
    assert!(json["metadata"].get("output_file").is_none());
}

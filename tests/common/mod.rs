//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tabprep::pipeline::Dataset;
use tempfile::TempDir;

/// Create a labelled DataFrame with `majority` rows of class "A" followed by
/// `minority` rows of class "B" and `n_features` numeric features.
///
/// Feature `i` is shifted by `(i % 4) as f64` for class "B", so features
/// carry different amounts of class signal. Column order is
/// `feature_0..feature_{n-1}`, then `target`.
pub fn create_classification_dataframe(
    majority: usize,
    minority: usize,
    n_features: usize,
    seed: u64,
) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = majority + minority;

    let mut columns: Vec<Column> = Vec::with_capacity(n_features + 1);
    for i in 0..n_features {
        let shift = (i % 4) as f64;
        let values: Vec<f64> = (0..rows)
            .map(|r| {
                let noise: f64 = rng.gen::<f64>() * 2.0;
                if r < majority {
                    noise
                } else {
                    noise + shift
                }
            })
            .collect();
        columns.push(Column::new(format!("feature_{}", i).into(), values));
    }

    let target: Vec<&str> = (0..rows)
        .map(|r| if r < majority { "A" } else { "B" })
        .collect();
    columns.push(Column::new("target".into(), target));

    DataFrame::new(columns).unwrap()
}

/// The 100-row, 80/20, 12-feature dataset used for end-to-end checks
pub fn create_reference_dataframe() -> DataFrame {
    create_classification_dataframe(80, 20, 12, 2024)
}

/// Wrap a DataFrame in a Dataset (kinds detected, keys 0..n)
pub fn dataset(df: DataFrame) -> Dataset {
    Dataset::from_frame(df).unwrap()
}

/// Create a DataFrame with numeric and categorical gaps
pub fn create_missing_test_dataframe() -> DataFrame {
    df! {
        "age" => [Some(20.0f64), None, Some(40.0), Some(60.0), None],
        "income" => [Some(1i64), Some(2), Some(3), Some(4), Some(5)],
        "city" => [Some("paris"), None, Some("rome"), Some("paris"), None],
        "target" => ["y", "n", "y", "n", "y"],
    }
    .unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a Dataset has expected shape
pub fn assert_shape(ds: &Dataset, expected_rows: usize, expected_cols: usize) {
    assert_eq!(
        ds.height(),
        expected_rows,
        "Row count mismatch: expected {}, got {}",
        expected_rows,
        ds.height()
    );
    assert_eq!(
        ds.width(),
        expected_cols,
        "Column count mismatch: expected {}, got {}",
        expected_cols,
        ds.width()
    );
}

/// Row count of `label` in a class-count map (0 when absent)
pub fn count_of(counts: &BTreeMap<Option<String>, usize>, label: &str) -> usize {
    counts.get(&Some(label.to_string())).copied().unwrap_or(0)
}

/// Non-missing values of a numeric column
pub fn values(ds: &Dataset, name: &str) -> Vec<f64> {
    ds.numeric_values(name).unwrap().into_iter().flatten().collect()
}

/// Population mean and standard deviation
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Sample covariance of two equally long slices
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let ma = a.iter().sum::<f64>() / n;
    let mb = b.iter().sum::<f64>() / n;
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - ma) * (y - mb))
        .sum::<f64>()
        / (n - 1.0)
}

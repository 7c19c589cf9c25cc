//! Missing value imputation
//!
//! Numeric columns are filled with their mean, categorical columns with their
//! most frequent value. Each column is handled independently.

use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::{debug, info};

use super::dataset::{ColumnKind, ColumnSpec, Dataset};
use super::error::{PipelineError, Result};

/// Replace every missing value in the dataset.
///
/// - Numeric columns: mean of the non-missing values (NaN counts as missing).
///   Ordinal columns round the mean to the nearest bin index.
/// - Categorical columns: most frequent value; ties go to the
///   lexicographically smallest value.
///
/// Shape, column order, kinds and row keys are unchanged. A column with no
/// non-missing values is an `InsufficientData` error.
pub fn impute_missing(dataset: &Dataset) -> Result<Dataset> {
    let mut replacements: Vec<(ColumnSpec, Column)> = Vec::new();

    for spec in dataset.schema() {
        let replacement = match spec.kind {
            ColumnKind::Numeric | ColumnKind::Ordinal => impute_numeric(dataset, spec)?,
            ColumnKind::Categorical => impute_categorical(dataset, spec)?,
        };
        if let Some(column) = replacement {
            replacements.push((spec.clone(), column));
        }
    }

    info!(columns_filled = replacements.len(), "Missing value imputation complete");
    dataset.with_replaced(replacements)
}

fn impute_numeric(dataset: &Dataset, spec: &ColumnSpec) -> Result<Option<Column>> {
    let values = dataset.numeric_values(&spec.name)?;
    let mean = column_mean(&values).ok_or_else(|| {
        PipelineError::insufficient(&spec.name, "no non-missing values, mean is undefined")
    })?;

    let missing = values.iter().filter(|v| is_missing(v)).count();
    if missing == 0 {
        return Ok(None);
    }
    debug!(column = %spec.name, missing, mean, "Filling numeric column with mean");

    let column = match spec.kind {
        ColumnKind::Ordinal => {
            let fill = mean.round() as i64;
            let filled: Vec<i64> = values
                .iter()
                .map(|v| match v {
                    Some(x) if !x.is_nan() => *x as i64,
                    _ => fill,
                })
                .collect();
            Column::new(spec.name.as_str().into(), filled)
        }
        _ => {
            let filled: Vec<f64> = values
                .iter()
                .map(|v| match v {
                    Some(x) if !x.is_nan() => *x,
                    _ => mean,
                })
                .collect();
            Column::new(spec.name.as_str().into(), filled)
        }
    };
    Ok(Some(column))
}

fn impute_categorical(dataset: &Dataset, spec: &ColumnSpec) -> Result<Option<Column>> {
    let values = dataset.text_values(&spec.name)?;
    let mode = most_frequent(values.iter().flatten().map(|s| s.as_str()))
        .map(str::to_string)
        .ok_or_else(|| {
            PipelineError::insufficient(&spec.name, "no non-missing values, mode is undefined")
        })?;

    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing == 0 {
        return Ok(None);
    }
    debug!(column = %spec.name, missing, mode = %mode, "Filling categorical column with mode");

    let filled: Vec<String> = values
        .into_iter()
        .map(|v| v.unwrap_or_else(|| mode.clone()))
        .collect();
    Ok(Some(Column::new(spec.name.as_str().into(), filled)))
}

fn is_missing(value: &Option<f64>) -> bool {
    match value {
        Some(x) => x.is_nan(),
        None => true,
    }
}

/// Mean over non-missing values, or `None` if there are none.
pub(crate) fn column_mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .filter(|x| !x.is_nan())
        .fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Most frequent value; ties resolved to the smallest by `Ord`.
pub(crate) fn most_frequent<T: Ord>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        // BTreeMap iterates in ascending order, so only a strictly larger
        // count may replace the current best
        if best.as_ref().map_or(true, |(_, c)| count > *c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

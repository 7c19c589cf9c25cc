//! Principal component analysis on a feature-only matrix.
//!
//! Algorithm:
//! 1. Build the centered data matrix X (n_rows x n_features)
//! 2. Covariance C = Xᵀ X / (n - 1)
//! 3. Symmetric eigen-decomposition of C
//! 4. Project X onto the eigenvectors and order components by variance
//!
//! Fit and apply happen on the same data; no model is kept between calls.

use faer::{Mat, Side};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use super::dataset::{ColumnKind, ColumnSpec, Dataset};
use super::error::{PipelineError, Result, Stage};

/// Explained variance of one principal component
#[derive(Debug, Clone, Serialize)]
pub struct ComponentVariance {
    pub component: String,
    pub explained_variance: f64,
    pub explained_variance_ratio: f64,
}

/// Result of dimensionality reduction
#[derive(Debug, Clone)]
pub struct Projection {
    /// Columns `PC1..PCn`, same row keys as the input
    pub dataset: Dataset,
    /// Per-component variance, in column order
    pub components: Vec<ComponentVariance>,
}

/// Name of the i-th (0-based) principal component column.
pub fn component_name(index: usize) -> String {
    format!("PC{}", index + 1)
}

/// Project a feature-only matrix onto its top principal components.
///
/// The target column must not be present. `n_components` is clamped to the
/// number of feature columns. Each direction's sign is chosen so that its
/// largest absolute loading is positive, which makes results reproducible.
pub fn reduce_dimensions(features: &Dataset, n_components: usize) -> Result<Projection> {
    if n_components == 0 {
        return Err(PipelineError::invalid_config("n_components", n_components, "at least 1"));
    }

    for spec in features.schema() {
        if !spec.kind.is_numeric() {
            return Err(PipelineError::NonNumericColumn {
                column: spec.name.clone(),
                stage: Stage::Reduce,
            });
        }
    }

    let n_features = features.width();
    let n_rows = features.height();
    if n_features == 0 {
        return Err(PipelineError::insufficient(
            "feature matrix",
            "no feature columns to project",
        ));
    }
    if n_rows < 2 {
        return Err(PipelineError::insufficient(
            "feature matrix",
            format!("{} row(s); at least two are needed to estimate a covariance", n_rows),
        ));
    }

    let k = n_components.min(n_features);
    let x = centered_matrix(features)?;

    // Covariance C = Xᵀ X / (n - 1)
    let gram = x.transpose() * &x;
    let denom = (n_rows - 1) as f64;
    let mut cov = Mat::<f64>::zeros(n_features, n_features);
    for i in 0..n_features {
        for j in 0..n_features {
            cov[(i, j)] = gram[(i, j)] / denom;
        }
    }
    let total_variance: f64 = (0..n_features).map(|j| cov[(j, j)]).sum();

    let eigen = cov.selfadjoint_eigendecomposition(Side::Lower);
    let directions = eigen.u();
    let scores = x.as_ref() * directions;

    // Variance of every projected direction
    let mut variances: Vec<(usize, f64)> = (0..n_features)
        .map(|c| {
            let ss: f64 = (0..n_rows).map(|i| scores[(i, c)].powi(2)).sum();
            (c, ss / denom)
        })
        .collect();
    variances.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut columns = Vec::with_capacity(k);
    let mut schema = Vec::with_capacity(k);
    let mut components = Vec::with_capacity(k);

    for (rank, &(c, variance)) in variances.iter().take(k).enumerate() {
        let sign = dominant_sign((0..n_features).map(|r| directions[(r, c)]));
        let values: Vec<f64> = (0..n_rows).map(|i| sign * scores[(i, c)]).collect();
        let name = component_name(rank);

        let ratio = if total_variance > 0.0 {
            variance / total_variance
        } else {
            0.0
        };
        debug!(component = %name, variance, ratio, "Extracted principal component");

        columns.push(Column::new(name.as_str().into(), values));
        schema.push(ColumnSpec::new(name.as_str(), ColumnKind::Numeric));
        components.push(ComponentVariance {
            component: name,
            explained_variance: variance,
            explained_variance_ratio: ratio,
        });
    }

    info!(
        features = n_features,
        components = k,
        explained = components.iter().map(|c| c.explained_variance_ratio).sum::<f64>(),
        "Dimensionality reduction complete"
    );

    let frame = DataFrame::new(columns)?;
    Ok(Projection {
        dataset: Dataset::from_parts(frame, schema, features.row_keys().to_vec()),
        components,
    })
}

/// Column-centered data matrix. Missing values are rejected.
fn centered_matrix(features: &Dataset) -> Result<Mat<f64>> {
    let n_rows = features.height();
    let mut x = Mat::<f64>::zeros(n_rows, features.width());

    for (j, spec) in features.schema().iter().enumerate() {
        let mut values = Vec::with_capacity(n_rows);
        for value in features.numeric_values(&spec.name)? {
            match value {
                Some(v) if v.is_finite() => values.push(v),
                _ => {
                    return Err(PipelineError::insufficient(
                        &spec.name,
                        "contains missing values; impute before projecting",
                    ))
                }
            }
        }

        let mean = values.iter().sum::<f64>() / n_rows as f64;
        for (i, v) in values.iter().enumerate() {
            x[(i, j)] = v - mean;
        }
    }

    Ok(x)
}

/// +1 if the largest-magnitude loading is non-negative, -1 otherwise.
fn dominant_sign(loadings: impl Iterator<Item = f64>) -> f64 {
    let dominant = loadings.fold(0.0f64, |best, v| if v.abs() > best.abs() { v } else { best });
    if dominant < 0.0 {
        -1.0
    } else {
        1.0
    }
}

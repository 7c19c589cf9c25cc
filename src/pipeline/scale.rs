//! Per-column rescaling of a feature-only matrix

use polars::prelude::*;
use tracing::info;

use super::config::ScalingMethod;
use super::dataset::{ColumnKind, ColumnSpec, Dataset};
use super::error::{PipelineError, Result, Stage};

/// Rescale every column independently with `method`.
///
/// - `Standard`: `(x - mean) / std` with the population std (ddof = 0), as in
///   the usual standard scaler; the output has population std 1, so its
///   sample std is `sqrt(n / (n - 1))`. A zero-variance column is only
///   centered.
/// - `Normalization`: `(x - min) / (max - min)`. A zero-range column becomes 0.
///
/// Column names and row keys are preserved; ordinal inputs come out as
/// numeric. Missing values stay missing. The target must not be present.
pub fn scale(features: &Dataset, method: ScalingMethod) -> Result<Dataset> {
    let mut replacements = Vec::with_capacity(features.width());

    for spec in features.schema() {
        if !spec.kind.is_numeric() {
            return Err(PipelineError::NonNumericColumn {
                column: spec.name.clone(),
                stage: Stage::Scale,
            });
        }

        let values = features.numeric_values(&spec.name)?;
        let scaled = match method {
            ScalingMethod::Standard => standardize(&values),
            ScalingMethod::Normalization => normalize(&values),
        };
        replacements.push((
            ColumnSpec::new(spec.name.as_str(), ColumnKind::Numeric),
            Column::new(spec.name.as_str().into(), scaled),
        ));
    }

    info!(columns = replacements.len(), method = %method, "Scaling complete");
    features.with_replaced(replacements)
}

fn present(values: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    values.iter().flatten().copied().filter(|x| !x.is_nan())
}

fn standardize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let (sum, count) = present(values).fold((0.0, 0usize), |(s, c), x| (s + x, c + 1));
    if count == 0 {
        return values.to_vec();
    }
    let mean = sum / count as f64;
    let variance = present(values).map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;
    let std = variance.sqrt();
    let divisor = if std > 0.0 { std } else { 1.0 };

    values
        .iter()
        .map(|v| v.map(|x| (x - mean) / divisor))
        .collect()
}

fn normalize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let Some((min, max)) = present(values).fold(None, |acc: Option<(f64, f64)>, x| match acc {
        None => Some((x, x)),
        Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
    }) else {
        return values.to_vec();
    };
    let range = max - min;

    values
        .iter()
        .map(|v| {
            v.map(|x| if range > 0.0 { (x - min) / range } else { 0.0 })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardize_zero_mean_unit_variance() {
        let values: Vec<Option<f64>> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].iter().map(|&v| Some(v)).collect();
        let scaled: Vec<f64> = standardize(&values).into_iter().flatten().collect();
        // mean 5, population std 2
        assert_eq!(scaled[0], -1.5);
        assert_eq!(scaled[7], 2.0);
    }

    #[test]
    fn test_standardize_constant_column_is_centered() {
        let scaled = standardize(&[Some(3.0), Some(3.0)]);
        assert_eq!(scaled, vec![Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_normalize_bounds_and_missing() {
        let scaled = normalize(&[Some(10.0), None, Some(20.0), Some(15.0)]);
        assert_eq!(scaled, vec![Some(0.0), None, Some(1.0), Some(0.5)]);
        assert_eq!(normalize(&[Some(4.0), Some(4.0)]), vec![Some(0.0), Some(0.0)]);
    }
}

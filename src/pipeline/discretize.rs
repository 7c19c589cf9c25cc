//! Equal-width discretization of numeric columns into ordinal bin indices

use polars::prelude::*;
use tracing::{debug, info};

use super::dataset::{ColumnKind, ColumnSpec, Dataset};
use super::error::{PipelineError, Result, Stage};

/// Bin edges of one discretized column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinEdges {
    pub min: f64,
    pub max: f64,
    pub bins: usize,
}

impl BinEdges {
    /// Edges over the non-missing values, or `None` if there are none.
    pub fn fit(values: &[Option<f64>], bins: usize) -> Option<Self> {
        let mut finite = values.iter().flatten().copied().filter(|x| x.is_finite());
        let first = finite.next()?;
        let (min, max) = finite.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)));
        Some(Self { min, max, bins })
    }

    /// Bin index of `value`.
    ///
    /// Intervals are right-closed: a value on an interior edge belongs to the
    /// lower bin, the minimum falls in bin 0 and the maximum in the last bin.
    /// A zero-range column maps every value to bin 0.
    pub fn bin_of(&self, value: f64) -> i64 {
        let range = self.max - self.min;
        if range <= 0.0 {
            return 0;
        }
        let width = range / self.bins as f64;
        let position = ((value - self.min) / width).ceil() as i64 - 1;
        position.clamp(0, self.bins as i64 - 1)
    }
}

/// Replace each named column by its equal-width bin index (0-based).
///
/// Every named column must exist (checked before anything is converted) and
/// be numeric. Converted columns become [`ColumnKind::Ordinal`]. Missing
/// values stay missing.
pub fn discretize(dataset: &Dataset, columns: &[String], bins: usize) -> Result<Dataset> {
    if bins == 0 {
        return Err(PipelineError::invalid_config("bins", bins, "at least 1"));
    }

    for name in columns {
        let spec = dataset.require(name, Stage::Discretize)?;
        if !spec.kind.is_numeric() {
            return Err(PipelineError::NonNumericColumn {
                column: name.clone(),
                stage: Stage::Discretize,
            });
        }
    }

    let mut replacements = Vec::with_capacity(columns.len());
    for name in columns {
        let values = dataset.numeric_values(name)?;
        let binned: Vec<Option<i64>> = match BinEdges::fit(&values, bins) {
            Some(edges) => {
                debug!(column = %name, min = edges.min, max = edges.max, bins, "Discretizing column");
                values
                    .iter()
                    .map(|v| v.filter(|x| !x.is_nan()).map(|x| edges.bin_of(x)))
                    .collect()
            }
            None => {
                debug!(column = %name, "Column has no values to bin");
                vec![None; values.len()]
            }
        };

        replacements.push((
            ColumnSpec::new(name.as_str(), ColumnKind::Ordinal),
            Column::new(name.as_str().into(), binned),
        ));
    }

    info!(columns = columns.len(), bins, "Discretization complete");
    dataset.with_replaced(replacements)
}

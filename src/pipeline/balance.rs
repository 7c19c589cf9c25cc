//! Class balancing by minority upsampling
//!
//! The split is always binary: rows whose label equals the target's mode form
//! the majority, and **every other label is pooled into one minority group**.
//! A target with three or more distinct labels therefore collapses into two
//! buckets. This is the documented policy, and a warning is logged when it
//! applies.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{info, warn};

use super::dataset::Dataset;
use super::error::{describe_label, PipelineError, Result, Stage};
use super::impute::most_frequent;

/// Majority/minority split of a target column.
///
/// A missing label is a class of its own (`None`) and never merges with any
/// text label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSplit {
    /// The mode of the target column; `None` when missing labels are the mode
    pub majority_label: Option<String>,
    /// Row positions carrying the mode
    pub majority_rows: Vec<usize>,
    /// Row positions carrying any other label (pooled)
    pub minority_rows: Vec<usize>,
    /// Number of distinct labels in the target, missing included
    pub distinct_labels: usize,
}

/// Count rows per target label, ordered by label. Missing labels count under
/// `None`, which sorts first.
pub fn class_counts(dataset: &Dataset, target: &str) -> Result<BTreeMap<Option<String>, usize>> {
    dataset.require(target, Stage::Balance)?;
    let mut counts = BTreeMap::new();
    for label in dataset.text_values(target)? {
        *counts.entry(label).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Split rows into the mode (majority) and everything else (pooled minority).
///
/// Mode ties go to the smallest label, with the missing label ordered first.
pub fn split_classes(dataset: &Dataset, target: &str) -> Result<ClassSplit> {
    dataset.require(target, Stage::Balance)?;
    let labels = dataset.text_values(target)?;

    let majority_label = most_frequent(labels.iter().map(|label| label.as_deref()))
        .map(|label| label.map(str::to_string))
        .ok_or_else(|| {
            PipelineError::insufficient(target, "target column has no rows, mode is undefined")
        })?;

    let (majority_rows, minority_rows): (Vec<usize>, Vec<usize>) =
        (0..labels.len()).partition(|&i| labels[i] == majority_label);

    let mut distinct: Vec<Option<&str>> = labels.iter().map(|label| label.as_deref()).collect();
    distinct.sort_unstable();
    distinct.dedup();

    Ok(ClassSplit {
        majority_label,
        majority_rows,
        minority_rows,
        distinct_labels: distinct.len(),
    })
}

/// Upsample the pooled minority group until it matches the majority size.
///
/// Draws `majority_count` minority rows with replacement from `rng`, then
/// returns majority rows (original order) followed by the drawn rows (draw
/// order). Row keys of the output are reset to `0..2 * majority_count`.
pub fn balance_classes<R: Rng + ?Sized>(dataset: &Dataset, target: &str, rng: &mut R) -> Result<Dataset> {
    let split = split_classes(dataset, target)?;

    if split.minority_rows.is_empty() {
        return Err(PipelineError::Imbalance {
            target: target.to_string(),
            majority_label: split.majority_label,
        });
    }

    if split.distinct_labels > 2 {
        warn!(
            column = target,
            distinct_labels = split.distinct_labels,
            majority = %describe_label(&split.majority_label),
            "Target has more than two labels; all non-majority labels are pooled into one minority group"
        );
    }

    let majority_count = split.majority_rows.len();
    let mut positions = Vec::with_capacity(majority_count * 2);
    positions.extend_from_slice(&split.majority_rows);
    for _ in 0..majority_count {
        let pick = rng.gen_range(0..split.minority_rows.len());
        positions.push(split.minority_rows[pick]);
    }

    info!(
        column = target,
        majority = %describe_label(&split.majority_label),
        majority_count,
        minority_count = split.minority_rows.len(),
        "Upsampled minority group"
    );

    dataset.take_rows(&positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn labelled(labels: &[&str]) -> Dataset {
        let x: Vec<f64> = (0..labels.len()).map(|i| i as f64).collect();
        let df = df! {
            "x" => x,
            "y" => labels.to_vec(),
        }
        .unwrap();
        Dataset::from_frame(df).unwrap()
    }

    #[test]
    fn test_split_pools_all_non_mode_labels() {
        let ds = labelled(&["a", "a", "a", "b", "c"]);
        let split = split_classes(&ds, "y").unwrap();
        assert_eq!(split.majority_label.as_deref(), Some("a"));
        assert_eq!(split.majority_rows, vec![0, 1, 2]);
        assert_eq!(split.minority_rows, vec![3, 4]);
        assert_eq!(split.distinct_labels, 3);
    }

    #[test]
    fn test_mode_tie_goes_to_smallest_label() {
        let ds = labelled(&["b", "a", "b", "a"]);
        let split = split_classes(&ds, "y").unwrap();
        assert_eq!(split.majority_label.as_deref(), Some("a"));
    }

    #[test]
    fn test_missing_labels_are_their_own_class() {
        let df = df! {
            "x" => [0.0f64, 1.0, 2.0, 3.0, 4.0],
            "y" => [Some("<null>"), Some("<null>"), None, None, Some("a")],
        }
        .unwrap();
        let ds = Dataset::from_frame(df).unwrap();

        let counts = class_counts(&ds, "y").unwrap();
        assert_eq!(counts.get(&None), Some(&2));
        assert_eq!(counts.get(&Some("<null>".to_string())), Some(&2));
        assert_eq!(counts.len(), 3);

        // Two tied groups of 2; missing sorts first
        let split = split_classes(&ds, "y").unwrap();
        assert_eq!(split.majority_label, None);
        assert_eq!(split.majority_rows, vec![2, 3]);
        assert_eq!(split.minority_rows, vec![0, 1, 4]);
        assert_eq!(split.distinct_labels, 3);
    }

    #[test]
    fn test_resampled_rows_come_from_minority_only() {
        let ds = labelled(&["a", "a", "a", "a", "b"]);
        let mut rng = StdRng::seed_from_u64(7);
        let balanced = balance_classes(&ds, "y", &mut rng).unwrap();

        let x = balanced.numeric_values("x").unwrap();
        assert_eq!(&x[..4], &[Some(0.0), Some(1.0), Some(2.0), Some(3.0)]);
        assert!(x[4..].iter().all(|v| *v == Some(4.0)));
        assert_eq!(balanced.row_keys(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    }
}

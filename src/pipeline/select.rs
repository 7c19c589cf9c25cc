//! ANOVA F-test feature selection
//!
//! Every numeric feature is scored against the target labels with a one-way
//! analysis-of-variance F statistic and the highest-scoring features are kept.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::dataset::Dataset;
use super::error::{Result, Stage};

/// Upper bound on the number of features kept. Fixed policy, not configurable.
pub const MAX_SELECTED_FEATURES: usize = 10;

/// F-test score of a single feature
#[derive(Debug, Clone, Serialize)]
pub struct FeatureScore {
    pub feature: String,
    /// F statistic; NaN when undefined (fewer than two classes, constant feature)
    pub f_score: f64,
    pub selected: bool,
}

/// Result of feature selection
#[derive(Debug, Clone)]
pub struct Selection {
    /// Selected features in original column order, followed by the target
    pub dataset: Dataset,
    /// Scores of every candidate feature, in original column order
    pub scores: Vec<FeatureScore>,
}

impl Selection {
    pub fn selected_features(&self) -> Vec<String> {
        self.scores
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.feature.clone())
            .collect()
    }
}

/// One-way ANOVA F statistic of `values` grouped by `labels`.
///
/// Rows with a missing value are skipped; a missing label forms its own
/// group, as in class balancing. Returns NaN when the statistic is
/// undefined and +infinity when every group is constant but the group means
/// differ.
pub fn anova_f_score(values: &[Option<f64>], labels: &[Option<String>]) -> f64 {
    let mut groups: BTreeMap<Option<&str>, (f64, f64, usize)> = BTreeMap::new();
    let mut total_sum = 0.0;
    let mut total_sq = 0.0;
    let mut n = 0usize;

    for (value, label) in values.iter().zip(labels) {
        let Some(x) = value.filter(|x| !x.is_nan()) else {
            continue;
        };
        let group = groups.entry(label.as_deref()).or_insert((0.0, 0.0, 0));
        group.0 += x;
        group.1 += x * x;
        group.2 += 1;
        total_sum += x;
        total_sq += x * x;
        n += 1;
    }

    let k = groups.len();
    if k < 2 || n <= k {
        return f64::NAN;
    }

    let grand_mean = total_sum / n as f64;
    let ss_total = total_sq - n as f64 * grand_mean * grand_mean;
    let ss_between: f64 = groups
        .values()
        .map(|(sum, _, count)| {
            let mean = sum / *count as f64;
            *count as f64 * (mean - grand_mean).powi(2)
        })
        .sum();
    let ss_within = (ss_total - ss_between).max(0.0);

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within;

    // Relative tolerance: sums of squares cancel to tiny residues for
    // constant features
    let scale = ss_total.abs().max(1.0);
    let between_zero = ss_between <= scale * 1e-12;
    let within_zero = ss_within <= scale * 1e-12;

    match (between_zero, within_zero) {
        (true, true) => f64::NAN,
        (false, true) => f64::INFINITY,
        _ => ms_between / ms_within,
    }
}

/// Keep the `min(10, feature_count)` features with the highest F scores.
///
/// Candidates are the numeric (numeric or ordinal) columns other than the
/// target; categorical features cannot be scored and are left out. Ties, and
/// NaN scores which rank last, are broken by original column order. The
/// output lists the selected features in original column order, then the
/// target column joined back by row key.
pub fn select_features(dataset: &Dataset, target: &str) -> Result<Selection> {
    dataset.require(target, Stage::Select)?;
    let (features, target_column) = dataset.split_target(target, Stage::Select)?;

    let labels = target_column.text_values()?;

    let partition = features.partition();
    if !partition.categorical.is_empty() {
        warn!(
            excluded = ?partition.categorical,
            "Categorical features cannot be scored by the F-test and are excluded from selection"
        );
    }

    let mut scores = Vec::with_capacity(partition.numeric.len());
    for name in &partition.numeric {
        let values = features.numeric_values(name)?;
        let f_score = anova_f_score(&values, &labels);
        debug!(feature = %name, f_score, "Scored feature");
        scores.push(FeatureScore {
            feature: name.clone(),
            f_score,
            selected: false,
        });
    }

    let k = MAX_SELECTED_FEATURES.min(scores.len());
    let mut ranking: Vec<usize> = (0..scores.len()).collect();
    // Stable sort keeps original order among equal scores
    ranking.sort_by(|&a, &b| compare_scores(scores[a].f_score, scores[b].f_score));
    for &idx in ranking.iter().take(k) {
        scores[idx].selected = true;
    }

    let keep: Vec<String> = scores
        .iter()
        .filter(|s| s.selected)
        .map(|s| s.feature.clone())
        .collect();

    info!(
        candidates = scores.len(),
        selected = keep.len(),
        "Feature selection complete"
    );

    let dataset = features
        .select_columns(&keep)?
        .attach_target(&target_column, Stage::Select)?;
    Ok(Selection { dataset, scores })
}

/// Descending by score, NaN last.
fn compare_scores(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

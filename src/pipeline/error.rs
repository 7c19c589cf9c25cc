//! Error taxonomy for the preprocessing pipeline.
//!
//! Every stage returns [`PipelineError`]. Errors propagate unmodified to the
//! caller: no stage catches or retries another stage's failure.

use std::fmt;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use serde::Serialize;

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Impute,
    Balance,
    Discretize,
    Select,
    Reduce,
    Scale,
    Combine,
}

impl Stage {
    /// All stages in the order the orchestrator runs them.
    pub const ALL: [Stage; 8] = [
        Stage::Load,
        Stage::Impute,
        Stage::Balance,
        Stage::Discretize,
        Stage::Select,
        Stage::Reduce,
        Stage::Scale,
        Stage::Combine,
    ];

    /// Human-readable title used in step headers.
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Load => "Load Dataset",
            Stage::Impute => "Missing Value Imputation",
            Stage::Balance => "Class Balancing",
            Stage::Discretize => "Discretization",
            Stage::Select => "Feature Selection",
            Stage::Reduce => "Dimensionality Reduction",
            Stage::Scale => "Scaling",
            Stage::Combine => "Combine Target",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Impute => "impute",
            Stage::Balance => "balance",
            Stage::Discretize => "discretize",
            Stage::Select => "select",
            Stage::Reduce => "reduce",
            Stage::Scale => "scale",
            Stage::Combine => "combine",
        };
        write!(f, "{}", name)
    }
}

/// Errors that can abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Input cannot be read or parsed. Raised before any stage runs.
    #[error("Failed to read dataset '{}': {reason}", path.display())]
    DataAccess { path: PathBuf, reason: String },

    /// A named column (target or discretization column) is absent.
    #[error("Column '{column}' not found (required by {stage} stage)")]
    MissingColumn { column: String, stage: Stage },

    /// No non-missing values exist to compute a statistic from.
    #[error("Insufficient data for '{subject}': {reason}")]
    InsufficientData { subject: String, reason: String },

    /// Every row carries the majority label, so there is nothing to resample.
    #[error(
        "Target '{target}' has no minority rows to resample: every row is labelled {}",
        describe_label(.majority_label)
    )]
    Imbalance {
        target: String,
        /// `None` when every label is missing
        majority_label: Option<String>,
    },

    /// Configuration value outside its allowed set or range.
    #[error("Invalid value '{value}' for '{option}': expected {expected}")]
    InvalidConfig {
        option: &'static str,
        value: String,
        expected: String,
    },

    /// A numeric-only stage received a categorical column.
    #[error("Column '{column}' is categorical but the {stage} stage requires numeric input")]
    NonNumericColumn { column: String, stage: Stage },

    /// Target and feature rows could not be matched by row key.
    #[error("Row alignment failed during {stage}: {detail}")]
    RowAlignment { stage: Stage, detail: String },

    /// Unexpected failure inside the dataframe engine.
    #[error(transparent)]
    Frame(#[from] PolarsError),
}

impl PipelineError {
    pub(crate) fn missing_column(column: impl Into<String>, stage: Stage) -> Self {
        PipelineError::MissingColumn {
            column: column.into(),
            stage,
        }
    }

    pub(crate) fn insufficient(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::InsufficientData {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(
        option: &'static str,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        PipelineError::InvalidConfig {
            option,
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// Quoted label text, or `missing` for an absent label.
pub(crate) fn describe_label(label: &Option<String>) -> String {
    match label {
        Some(text) => format!("'{}'", text),
        None => "missing".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_matches_all() {
        let names: Vec<String> = Stage::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec!["load", "impute", "balance", "discretize", "select", "reduce", "scale", "combine"]
        );
    }

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = PipelineError::missing_column("label", Stage::Balance);
        let msg = err.to_string();
        assert!(msg.contains("label"));
        assert!(msg.contains("balance"));

        let err = PipelineError::invalid_config("scaling_method", "bogus", "standard or normalization");
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_imbalance_message_handles_missing_label() {
        let err = PipelineError::Imbalance {
            target: "y".to_string(),
            majority_label: None,
        };
        assert!(err.to_string().ends_with("every row is labelled missing"));

        let err = PipelineError::Imbalance {
            target: "y".to_string(),
            majority_label: Some("a".to_string()),
        };
        assert!(err.to_string().ends_with("every row is labelled 'a'"));
    }
}

//! In-memory dataset representation shared by every pipeline stage.
//!
//! A [`Dataset`] wraps a polars `DataFrame` together with an explicit schema
//! (one [`ColumnKind`] per column, decided once at load time) and a vector of
//! row keys. Stages never mutate a dataset in place; each returns a new one.

use std::collections::HashMap;
use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, Result, Stage};

/// Element kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Numeric values in their source dtype, read as `f64`
    Numeric,
    /// Bin indices produced by discretization, stored as `Int64`
    Ordinal,
    /// Text labels, stored as `String`
    Categorical,
}

impl ColumnKind {
    /// Numeric and ordinal columns both take part in numeric transforms.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Numeric | ColumnKind::Ordinal)
    }

    fn detect(dtype: &DataType) -> Self {
        if dtype.is_primitive_numeric() {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Ordinal => write!(f, "ordinal"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Name and kind of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Column names split by element kind, in dataset column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPartition {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

/// A rectangular table of named, kind-tagged columns with stable row keys.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    schema: Vec<ColumnSpec>,
    row_keys: Vec<u64>,
}

/// The target column held aside while feature-only stages run.
#[derive(Debug, Clone)]
pub struct TargetColumn {
    spec: ColumnSpec,
    column: Column,
    row_keys: Vec<u64>,
}

impl Dataset {
    /// Build a dataset from a raw frame, detecting column kinds once.
    ///
    /// Primitive numeric columns become [`ColumnKind::Numeric`] and keep their
    /// physical dtype, so an integer label is written back as integers.
    /// Everything else becomes [`ColumnKind::Categorical`] and is cast to
    /// `String`. Row keys are assigned `0..height`.
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        let mut schema = Vec::with_capacity(frame.width());
        let mut columns = Vec::with_capacity(frame.width());

        for column in frame.get_columns() {
            let kind = ColumnKind::detect(column.dtype());
            let stored = match kind {
                ColumnKind::Categorical => column.cast(&DataType::String)?,
                _ => column.clone(),
            };
            columns.push(stored);
            schema.push(ColumnSpec::new(column.name().as_str(), kind));
        }

        let height = frame.height();
        let frame = DataFrame::new(columns)?;
        Ok(Self::from_parts(frame, schema, sequential_keys(height)))
    }

    pub(crate) fn from_parts(frame: DataFrame, schema: Vec<ColumnSpec>, row_keys: Vec<u64>) -> Self {
        debug_assert_eq!(frame.width(), schema.len());
        debug_assert!(frame.width() == 0 || frame.height() == row_keys.len());
        Self {
            frame,
            schema,
            row_keys,
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn schema(&self) -> &[ColumnSpec] {
        &self.schema
    }

    pub fn row_keys(&self) -> &[u64] {
        &self.row_keys
    }

    /// Row count. Taken from the row keys so a zero-column feature matrix
    /// still knows how many rows it spans.
    pub fn height(&self) -> usize {
        self.row_keys.len()
    }

    pub fn width(&self) -> usize {
        self.schema.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.iter().map(|spec| spec.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schema.iter().any(|spec| spec.name == name)
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.schema
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.kind)
    }

    /// Look up a column's spec, failing with `MissingColumn` for `stage`.
    pub fn require(&self, name: &str, stage: Stage) -> Result<&ColumnSpec> {
        self.schema
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| PipelineError::missing_column(name, stage))
    }

    /// Split column names into numeric (numeric + ordinal) and categorical.
    pub fn partition(&self) -> ColumnPartition {
        let mut partition = ColumnPartition::default();
        for spec in &self.schema {
            if spec.kind.is_numeric() {
                partition.numeric.push(spec.name.clone());
            } else {
                partition.categorical.push(spec.name.clone());
            }
        }
        partition
    }

    /// Values of a column as `f64`, with `None` for missing entries.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let floats = self.frame.column(name)?.cast(&DataType::Float64)?;
        Ok(floats.f64()?.into_iter().collect())
    }

    /// Values of a column rendered as text, with `None` for missing entries.
    pub fn text_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        column_text_values(self.frame.column(name)?)
    }

    /// Replace the values (and possibly the kind) of existing columns.
    ///
    /// Column order and row keys are preserved.
    pub(crate) fn with_replaced(&self, replacements: Vec<(ColumnSpec, Column)>) -> Result<Self> {
        let mut by_name: HashMap<String, (ColumnSpec, Column)> = replacements
            .into_iter()
            .map(|(spec, column)| (spec.name.clone(), (spec, column)))
            .collect();

        let mut schema = Vec::with_capacity(self.schema.len());
        let mut columns = Vec::with_capacity(self.schema.len());
        for (spec, column) in self.schema.iter().zip(self.frame.get_columns()) {
            match by_name.remove(&spec.name) {
                Some((new_spec, new_column)) => {
                    schema.push(new_spec);
                    columns.push(new_column);
                }
                None => {
                    schema.push(spec.clone());
                    columns.push(column.clone());
                }
            }
        }

        let frame = DataFrame::new(columns)?;
        Ok(Self::from_parts(frame, schema, self.row_keys.clone()))
    }

    /// Keep only the named columns, in the order given.
    pub fn select_columns(&self, names: &[String]) -> Result<Self> {
        let mut schema = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let spec = self
                .schema
                .iter()
                .find(|spec| &spec.name == name)
                .ok_or_else(|| PipelineError::missing_column(name.as_str(), Stage::Select))?;
            schema.push(spec.clone());
            columns.push(self.frame.column(name)?.clone());
        }

        let frame = DataFrame::new(columns)?;
        Ok(Self::from_parts(frame, schema, self.row_keys.clone()))
    }

    /// Gather rows by position into a new dataset with keys reset to `0..n`.
    pub fn take_rows(&self, positions: &[usize]) -> Result<Self> {
        let indices = IdxCa::from_vec(
            "rows".into(),
            positions.iter().map(|&p| p as IdxSize).collect(),
        );
        let frame = self.frame.take(&indices)?;
        Ok(Self::from_parts(
            frame,
            self.schema.clone(),
            sequential_keys(positions.len()),
        ))
    }

    /// Remove the target column, returning the feature matrix and the target.
    pub fn split_target(&self, target: &str, stage: Stage) -> Result<(Self, TargetColumn)> {
        let spec = self.require(target, stage)?.clone();
        let column = self.frame.column(target)?.clone();
        let frame = self.frame.drop(target)?;
        let schema = self
            .schema
            .iter()
            .filter(|s| s.name != target)
            .cloned()
            .collect();

        let features = Self::from_parts(frame, schema, self.row_keys.clone());
        let target = TargetColumn {
            spec,
            column,
            row_keys: self.row_keys.clone(),
        };
        Ok((features, target))
    }

    /// Append the target column, matching rows by key rather than position.
    pub fn attach_target(&self, target: &TargetColumn, stage: Stage) -> Result<Self> {
        if self.contains(&target.spec.name) {
            return Err(PipelineError::RowAlignment {
                stage,
                detail: format!("feature matrix already contains '{}'", target.spec.name),
            });
        }
        if self.height() != target.len() {
            return Err(PipelineError::RowAlignment {
                stage,
                detail: format!(
                    "{} feature rows but {} target rows",
                    self.height(),
                    target.len()
                ),
            });
        }

        let positions: HashMap<u64, usize> = target
            .row_keys
            .iter()
            .enumerate()
            .map(|(pos, &key)| (key, pos))
            .collect();

        let mut order = Vec::with_capacity(self.row_keys.len());
        for key in &self.row_keys {
            let pos = positions.get(key).ok_or_else(|| PipelineError::RowAlignment {
                stage,
                detail: format!("row key {} has no target value", key),
            })?;
            order.push(*pos);
        }

        let aligned = if order.iter().enumerate().all(|(i, &p)| i == p) {
            target.column.clone()
        } else {
            let indices = IdxCa::from_vec(
                "rows".into(),
                order.iter().map(|&p| p as IdxSize).collect(),
            );
            Column::from(target.column.as_materialized_series().take(&indices)?)
        };

        let mut columns = self.frame.get_columns().to_vec();
        columns.push(aligned);
        let mut schema = self.schema.clone();
        schema.push(target.spec.clone());

        let frame = DataFrame::new(columns)?;
        Ok(Self::from_parts(frame, schema, self.row_keys.clone()))
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.row_keys == other.row_keys
            && self.frame.equals_missing(&other.frame)
    }
}

impl TargetColumn {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.spec.kind
    }

    pub fn len(&self) -> usize {
        self.column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column.len() == 0
    }

    pub fn row_keys(&self) -> &[u64] {
        &self.row_keys
    }

    pub fn text_values(&self) -> Result<Vec<Option<String>>> {
        column_text_values(&self.column)
    }
}

fn column_text_values(column: &Column) -> Result<Vec<Option<String>>> {
    let text = column.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

fn sequential_keys(n: usize) -> Vec<u64> {
    (0..n as u64).collect()
}

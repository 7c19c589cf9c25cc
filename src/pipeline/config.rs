//! Pipeline configuration.
//!
//! Options can be assembled with [`PipelineConfig::builder()`], read from a
//! JSON file, or filled in from CLI flags. [`PipelineConfig::validate`] is the
//! single place configuration values are checked.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{PipelineError, Result};
use super::loader::LoadOptions;

/// Default number of discretization bins
pub const DEFAULT_BINS: usize = 5;

/// Default number of principal components
pub const DEFAULT_N_COMPONENTS: usize = 2;

/// Default seed for class-balancing resampling
pub const DEFAULT_SEED: u64 = 42;

/// Default number of rows used for CSV schema inference
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

/// Rescaling applied to the reduced feature matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScalingMethod {
    /// Zero mean, unit variance per column
    #[default]
    Standard,
    /// Linear rescale into [0, 1] per column
    Normalization,
}

impl fmt::Display for ScalingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalingMethod::Standard => write!(f, "standard"),
            ScalingMethod::Normalization => write!(f, "normalization"),
        }
    }
}

impl FromStr for ScalingMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(ScalingMethod::Standard),
            "normalization" => Ok(ScalingMethod::Normalization),
            _ => Err(PipelineError::invalid_config(
                "scaling_method",
                s,
                "one of 'standard', 'normalization'",
            )),
        }
    }
}

impl Serialize for ScalingMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScalingMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Configuration for a full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the label column. Required.
    pub target_column: String,

    /// Number of equal-width bins for discretization.
    /// Default: 5
    pub bins: usize,

    /// Requested number of principal components, clamped to the number of
    /// selected features.
    /// Default: 2
    pub n_components: usize,

    /// Scaling applied after dimensionality reduction.
    /// Default: standard
    pub scaling_method: ScalingMethod,

    /// Seed for the class-balancing random source.
    /// Default: 42
    pub seed: u64,

    /// Rows used for CSV dtype inference (0 = full scan).
    /// Default: 10000
    pub infer_schema_length: usize,

    /// Extra token treated as missing in CSV input, besides empty fields.
    /// Default: None
    pub missing_marker: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: String::new(),
            bins: DEFAULT_BINS,
            n_components: DEFAULT_N_COMPONENTS,
            scaling_method: ScalingMethod::default(),
            seed: DEFAULT_SEED,
            infer_schema_length: DEFAULT_INFER_SCHEMA_LENGTH,
            missing_marker: None,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    ///
    /// ```rust,ignore
    /// let config = PipelineConfig::builder()
    ///     .target_column("label")
    ///     .bins(4)
    ///     .build()?;
    /// ```
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Read a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::DataAccess {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse a configuration from JSON text. Out-of-enumeration values are
    /// reported as `InvalidConfig`.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| PipelineError::invalid_config("config", e, "a valid pipeline configuration"))
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(PipelineError::invalid_config(
                "target_column",
                &self.target_column,
                "a non-empty column name",
            ));
        }

        if self.bins == 0 {
            return Err(PipelineError::invalid_config("bins", self.bins, "at least 1"));
        }

        if self.n_components == 0 {
            return Err(PipelineError::invalid_config(
                "n_components",
                self.n_components,
                "at least 1",
            ));
        }

        Ok(())
    }

    /// Loader options derived from this configuration.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            infer_schema_length: self.infer_schema_length,
            missing_marker: self.missing_marker.clone(),
        }
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    target_column: Option<String>,
    bins: Option<usize>,
    n_components: Option<usize>,
    scaling_method: Option<ScalingMethod>,
    scaling_method_raw: Option<String>,
    seed: Option<u64>,
    infer_schema_length: Option<usize>,
    missing_marker: Option<String>,
}

impl PipelineConfigBuilder {
    pub fn target_column(mut self, name: impl Into<String>) -> Self {
        self.target_column = Some(name.into());
        self
    }

    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins);
        self
    }

    pub fn n_components(mut self, n: usize) -> Self {
        self.n_components = Some(n);
        self
    }

    pub fn scaling_method(mut self, method: ScalingMethod) -> Self {
        self.scaling_method = Some(method);
        self.scaling_method_raw = None;
        self
    }

    /// Set the scaling method by name; an unknown name fails at `build()`.
    pub fn scaling_method_name(mut self, name: impl Into<String>) -> Self {
        self.scaling_method_raw = Some(name.into());
        self.scaling_method = None;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    pub fn missing_marker(mut self, marker: impl Into<String>) -> Self {
        self.missing_marker = Some(marker.into());
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();

        let scaling_method = match (self.scaling_method, self.scaling_method_raw) {
            (_, Some(raw)) => raw.parse()?,
            (Some(method), None) => method,
            (None, None) => defaults.scaling_method,
        };

        let config = PipelineConfig {
            target_column: self.target_column.unwrap_or(defaults.target_column),
            bins: self.bins.unwrap_or(defaults.bins),
            n_components: self.n_components.unwrap_or(defaults.n_components),
            scaling_method,
            seed: self.seed.unwrap_or(defaults.seed),
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
            missing_marker: self.missing_marker.or(defaults.missing_marker),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.bins, 5);
        assert_eq!(config.n_components, 2);
        assert_eq!(config.scaling_method, ScalingMethod::Standard);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_scaling_method_parse_is_case_insensitive() {
        assert_eq!("Standard".parse::<ScalingMethod>().unwrap(), ScalingMethod::Standard);
        assert_eq!(
            "NORMALIZATION".parse::<ScalingMethod>().unwrap(),
            ScalingMethod::Normalization
        );
    }

    #[test]
    fn test_builder_rejects_unknown_scaling_name() {
        let err = PipelineConfig::builder()
            .target_column("y")
            .scaling_method_name("bogus")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidConfig { option: "scaling_method", .. }
        ));
    }

    #[test]
    fn test_validate_rejects_zero_bins_and_components() {
        let mut config = PipelineConfig {
            target_column: "y".to_string(),
            ..Default::default()
        };
        config.bins = 0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig { option: "bins", .. })
        ));

        config.bins = 3;
        config.n_components = 0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig { option: "n_components", .. })
        ));
    }

    #[test]
    fn test_json_roundtrip_uses_lowercase_method() {
        let config = PipelineConfig::builder()
            .target_column("label")
            .scaling_method(ScalingMethod::Normalization)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"normalization\""));
        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_json_missing_fields_take_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"target_column": "label", "bins": 7}"#).unwrap();
        assert_eq!(config.bins, 7);
        assert_eq!(config.n_components, DEFAULT_N_COMPONENTS);
    }

    #[test]
    fn test_json_bogus_method_is_invalid_config() {
        let err = PipelineConfig::from_json_str(r#"{"target_column": "y", "scaling_method": "bogus"}"#)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig { .. }));
    }
}

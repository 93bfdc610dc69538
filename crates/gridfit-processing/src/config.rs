//! Configuration types for the processing stages.
//!
//! This module provides the strategy enums shared by the pipeline stages and
//! the builder-style [`OutlierConfig`] for the Local Outlier Factor filter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scaling stage applied before imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// Leave values untouched
    #[default]
    Passthrough,
    /// Scale each row to unit L2 norm
    Normalizer,
    /// Remove the mean and scale to unit variance per column
    Standard,
    /// Remove the median and scale by the interquartile range per column
    Robust,
}

impl ScalerKind {
    /// All scaler kinds, in declaration order.
    pub const ALL: [ScalerKind; 4] = [
        ScalerKind::Passthrough,
        ScalerKind::Normalizer,
        ScalerKind::Standard,
        ScalerKind::Robust,
    ];

    /// Returns the name used in parameter grids and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalerKind::Passthrough => "passthrough",
            ScalerKind::Normalizer => "normalizer",
            ScalerKind::Standard => "standard",
            ScalerKind::Robust => "robust",
        }
    }
}

impl fmt::Display for ScalerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passthrough" | "none" => Ok(ScalerKind::Passthrough),
            "normalizer" => Ok(ScalerKind::Normalizer),
            "standard" | "standard_scaler" => Ok(ScalerKind::Standard),
            "robust" | "robust_scaler" => Ok(ScalerKind::Robust),
            other => Err(format!(
                "unknown scaler '{}' (expected passthrough, normalizer, standard or robust)",
                other
            )),
        }
    }
}

/// Statistic used to fill missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Use the mean of observed values
    #[default]
    Mean,
    /// Use the median of observed values
    Median,
    /// Use the most frequent observed value (smallest on ties)
    MostFrequent,
}

impl ImputeStrategy {
    /// Returns the name used in parameter grids and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImputeStrategy::Mean => "mean",
            ImputeStrategy::Median => "median",
            ImputeStrategy::MostFrequent => "most_frequent",
        }
    }
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImputeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            "most_frequent" | "mode" => Ok(ImputeStrategy::MostFrequent),
            other => Err(format!(
                "unknown imputation strategy '{}' (expected mean, median or most_frequent)",
                other
            )),
        }
    }
}

/// How the outlier threshold is derived from the LOF scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Contamination {
    /// Flag rows whose LOF exceeds 1.5
    #[default]
    Auto,
    /// Flag the given fraction of rows with the highest LOF
    Fixed(f64),
}

/// Configuration for the Local Outlier Factor filter.
///
/// Use [`OutlierConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust
/// use gridfit_processing::config::{Contamination, OutlierConfig};
///
/// let config = OutlierConfig::builder()
///     .n_neighbors(10)
///     .contamination(Contamination::Fixed(0.05))
///     .build()
///     .unwrap();
/// assert_eq!(config.n_neighbors, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// Number of neighbours used for the density comparison.
    /// Clamped to `n_rows - 1` at fit time.
    /// Default: 20
    pub n_neighbors: usize,

    /// Threshold rule for flagging outliers.
    /// Default: Auto
    pub contamination: Contamination,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 20,
            contamination: Contamination::Auto,
        }
    }
}

impl OutlierConfig {
    /// Create a new configuration builder.
    pub fn builder() -> OutlierConfigBuilder {
        OutlierConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.n_neighbors == 0 {
            return Err(ConfigValidationError::InvalidNeighbors(self.n_neighbors));
        }

        if let Contamination::Fixed(fraction) = self.contamination
            && !(fraction > 0.0 && fraction <= 0.5)
        {
            return Err(ConfigValidationError::InvalidContamination(fraction));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid LOF neighbours: {0} (must be at least 1)")]
    InvalidNeighbors(usize),

    #[error("Invalid contamination: {0} (must be in (0.0, 0.5])")]
    InvalidContamination(f64),
}

impl From<ConfigValidationError> for crate::error::ProcessingError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::ProcessingError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`OutlierConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct OutlierConfigBuilder {
    n_neighbors: Option<usize>,
    contamination: Option<Contamination>,
}

impl OutlierConfigBuilder {
    /// Set the number of neighbours for the density comparison.
    pub fn n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = Some(k);
        self
    }

    /// Set the outlier threshold rule.
    pub fn contamination(mut self, contamination: Contamination) -> Self {
        self.contamination = Some(contamination);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `OutlierConfig` or an error if validation fails.
    pub fn build(self) -> Result<OutlierConfig, ConfigValidationError> {
        let config = OutlierConfig {
            n_neighbors: self.n_neighbors.unwrap_or(20),
            contamination: self.contamination.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

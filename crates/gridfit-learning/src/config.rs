//! Configuration types for grid search and experiments.
//!
//! This module provides [`SearchConfig`] and [`ExperimentConfig`] with their
//! builders. Both derive `serde` so an experiment can be described in JSON;
//! missing fields take their defaults.
//!
//! # Example
//!
//! ```
//! use gridfit_learning::{ExperimentConfig, SearchConfig};
//!
//! let config = ExperimentConfig::builder()
//!     .data_dir("raw")
//!     .debug_sample(false)
//!     .search(SearchConfig::builder().cv_folds(3).n_jobs(2).build().expect("valid search"))
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.search.cv_folds, 3);
//! ```

use crate::cv::KFold;
use crate::error::{LearningError, Result};
use crate::grid::ParamGrid;
use crate::pipeline::PipelineParams;
use gridfit_processing::OutlierConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for cross-validated grid search.
///
/// # Validation
///
/// The builder validates on [`build()`](SearchConfigBuilder::build):
/// - `cv_folds` must be at least 2
/// - `n_jobs` must be `-1` or at least 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of cross-validation folds (default: 5).
    pub cv_folds: usize,

    /// Shuffle rows before cutting folds (default: false).
    pub shuffle: bool,

    /// Seed for the fold shuffle (default: 42).
    pub random_seed: u64,

    /// Number of parallel jobs (default: -1 for all cores).
    ///
    /// - `-1`: Use the global rayon pool (all cores)
    /// - `1`: Single-threaded
    /// - `n > 1`: A dedicated pool of exactly `n` threads
    pub n_jobs: i32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cv_folds: 5,
            shuffle: false,
            random_seed: 42,
            n_jobs: -1,
        }
    }
}

impl SearchConfig {
    /// Create a new builder for `SearchConfig`.
    #[must_use]
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Check every field against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.cv_folds < 2 {
            return Err(LearningError::InvalidConfig(
                "cv_folds must be at least 2".to_string(),
            ));
        }
        if self.n_jobs == 0 || self.n_jobs < -1 {
            return Err(LearningError::InvalidConfig(
                "n_jobs must be -1 (all cores) or at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The fold splitter described by this configuration.
    pub fn kfold(&self) -> KFold {
        let kfold = KFold::new(self.cv_folds);
        if self.shuffle {
            kfold.shuffled(self.random_seed)
        } else {
            kfold
        }
    }
}

/// Builder for [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Set the number of cross-validation folds (default: 5).
    #[must_use]
    pub fn cv_folds(mut self, folds: usize) -> Self {
        self.config.cv_folds = folds;
        self
    }

    /// Shuffle rows before cutting folds (default: false).
    #[must_use]
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.config.shuffle = shuffle;
        self
    }

    /// Set the seed for the fold shuffle (default: 42).
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Set the number of parallel jobs (default: -1 for all cores).
    #[must_use]
    pub fn n_jobs(mut self, jobs: i32) -> Self {
        self.config.n_jobs = jobs;
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if:
    /// - `cv_folds` is less than 2
    /// - `n_jobs` is 0 or below -1
    pub fn build(self) -> Result<SearchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration of a complete experiment run.
///
/// Defaults reproduce the reference experiment: inputs in `raw/`, LOF with 20
/// neighbours, the 1% debug sample, 5-fold search over
/// [`ParamGrid::experiment_default`], predictions in `prediction.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Directory holding `sample.csv`, `X_train.csv`, `y_train.csv`, `X_test.csv`.
    pub data_dir: PathBuf,

    /// Path of the prediction file.
    pub output: PathBuf,

    /// Outlier filter settings.
    pub outlier: OutlierConfig,

    /// Keep only ~1% of the cleaned training rows (default: true).
    pub debug_sample: bool,

    /// Seed for the debug sampler (default: 42).
    pub random_seed: u64,

    /// Grid search settings.
    pub search: SearchConfig,

    /// Pipeline parameters that grid points override.
    pub base_params: PipelineParams,

    /// The grid to search.
    pub param_grid: ParamGrid,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("raw"),
            output: PathBuf::from("prediction.csv"),
            outlier: OutlierConfig::default(),
            debug_sample: true,
            random_seed: 42,
            search: SearchConfig::default(),
            base_params: PipelineParams::default(),
            param_grid: ParamGrid::experiment_default(),
        }
    }
}

impl ExperimentConfig {
    /// Create a new builder for `ExperimentConfig`.
    #[must_use]
    pub fn builder() -> ExperimentConfigBuilder {
        ExperimentConfigBuilder::default()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every nested configuration and the grid.
    pub fn validate(&self) -> Result<()> {
        self.outlier
            .validate()
            .map_err(|e| LearningError::InvalidConfig(e.to_string()))?;
        self.search.validate()?;
        self.base_params.estimation.validate()?;
        for point in self.param_grid.candidates()? {
            self.base_params.with_params(&point)?;
        }
        Ok(())
    }
}

/// Builder for [`ExperimentConfig`].
#[derive(Debug, Clone, Default)]
pub struct ExperimentConfigBuilder {
    config: ExperimentConfig,
}

impl ExperimentConfigBuilder {
    /// Set the input directory (default: `raw`).
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the prediction file path (default: `prediction.csv`).
    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = path.into();
        self
    }

    /// Set the outlier filter settings.
    #[must_use]
    pub fn outlier(mut self, outlier: OutlierConfig) -> Self {
        self.config.outlier = outlier;
        self
    }

    /// Enable or disable the debug sample (default: true).
    #[must_use]
    pub fn debug_sample(mut self, enable: bool) -> Self {
        self.config.debug_sample = enable;
        self
    }

    /// Set the sampler seed (default: 42).
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Set the grid search settings.
    #[must_use]
    pub fn search(mut self, search: SearchConfig) -> Self {
        self.config.search = search;
        self
    }

    /// Set the base pipeline parameters.
    #[must_use]
    pub fn base_params(mut self, params: PipelineParams) -> Self {
        self.config.base_params = params;
        self
    }

    /// Set the grid to search.
    #[must_use]
    pub fn param_grid(mut self, grid: ParamGrid) -> Self {
        self.config.param_grid = grid;
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] for invalid outlier or search
    /// settings and [`LearningError::InvalidParameter`] for a grid point that
    /// does not resolve against the base parameters.
    pub fn build(self) -> Result<ExperimentConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

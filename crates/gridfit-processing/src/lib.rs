//! Data loading and preprocessing for gridfit experiments.
//!
//! # Overview
//!
//! This library provides the data side of a regression experiment:
//!
//! - **Loading**: CSV inputs keyed by an `id` column ([`io`], [`IndexedFrame`])
//! - **Outlier Removal**: Local Outlier Factor filtering of the training set
//!   ([`outliers`])
//! - **Sampling**: seeded train/test splits and the debug downsampler
//!   ([`sampler`])
//! - **Preprocessing Stages**: scalers and imputers sharing the
//!   [`Transformer`] fit/transform contract
//! - **Profiling**: per-column missing-value reports ([`profiler`])
//! - **Output**: the `id,y` prediction file
//!
//! Numeric stages work on `ndarray` matrices where a missing value is `NaN`.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gridfit_processing::{DataFiles, ExperimentData, OutlierConfig, OutlierFilter};
//! use gridfit_processing::config::{ImputeStrategy, ScalerKind};
//!
//! let data = ExperimentData::load(&DataFiles::in_dir("raw"))?;
//!
//! let filtered = OutlierFilter::new(OutlierConfig::default())
//!     .apply(&data.x_train, &data.y_train)?;
//! println!("Training data shape {:?}", filtered.features.shape());
//!
//! let mut scaler = ScalerKind::Robust.build();
//! let mut imputer = ImputeStrategy::Median.build();
//! let x = filtered.features.to_matrix()?;
//! let x = imputer.fit_transform(&scaler.fit_transform(&x)?)?;
//! ```

pub mod config;
pub mod error;
pub mod imputers;
pub mod io;
pub mod outliers;
pub mod profiler;
pub mod sampler;
pub mod scalers;
pub mod transform;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, Contamination, ImputeStrategy, OutlierConfig, OutlierConfigBuilder,
    ScalerKind,
};
pub use error::{ProcessingError, Result as ProcessingResult, ResultExt};
pub use imputers::SimpleImputer;
pub use io::{DataFiles, ExperimentData, read_csv, read_indexed_csv, write_predictions};
pub use outliers::{FilteredTraining, LocalOutlierFactor, OutlierFilter, OutlierSummary};
pub use profiler::{ColumnMissing, MissingValueProfiler, MissingValueReport};
pub use sampler::{SampleSummary, debug_sample, train_test_split};
pub use scalers::{Normalizer, Passthrough, RobustScaler, StandardScaler};
pub use transform::Transformer;
pub use types::IndexedFrame;

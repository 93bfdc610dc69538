//! gridfit-learning: pipeline composition, gradient boosting and grid search.
//!
//! This crate builds regression pipelines on top of `gridfit-processing`,
//! scores hyperparameter grids with k-fold cross-validation and runs the
//! complete load-filter-search-predict experiment.
//!
//! # Features
//!
//! - **Pipelines**: scale -> impute -> gradient-boosted trees, addressed by
//!   `stage__parameter` paths
//! - **Gradient Boosting**: second-order boosting with L1/L2 regularization and
//!   native handling of missing values
//! - **Grid Search**: exhaustive, parallel, ranked by mean R²
//! - **Experiments**: the full run driven by one [`ExperimentConfig`]
//! - **Progress Reporting**: per-stage and per-fit callbacks
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gridfit_learning::{Experiment, ExperimentConfig, SearchConfig};
//!
//! let config = ExperimentConfig::builder()
//!     .data_dir("raw")
//!     .search(SearchConfig::builder().cv_folds(5).build()?)
//!     .build()?;
//!
//! let report = Experiment::builder()
//!     .config(config)
//!     .on_progress(|u| println!("{:.0}% - {}", u.progress * 100.0, u.message))
//!     .build()?
//!     .run()?;
//!
//! for candidate in &report.candidates {
//!     println!("{}", candidate.summary_line());
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          gridfit-learning                        │
//! │                                                                  │
//! │  ExperimentConfig ──► Experiment ──► GridSearch ──► Pipeline     │
//! │                           │              │           │           │
//! │                           │         KFold, r2    scale/impute/   │
//! │                           │                      GBM regressor   │
//! └───────────────────────────┬──────────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         gridfit-processing                       │
//! │                                                                  │
//! │  CSV I/O, Local Outlier Factor, debug sampler, scalers, imputer  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, LearningError>`]. Errors from
//! the processing crate are wrapped in [`LearningError::Processing`] and keep
//! their error code.
//!
//! # Thread Safety
//!
//! Pipelines, regressors and searches are `Send + Sync`. Grid search runs its
//! fits on a rayon pool; progress callbacks are invoked from worker threads.

mod config;
mod cv;
mod error;
mod experiment;
pub mod gbm;
mod grid;
pub mod metrics;
mod model;
mod pipeline;
mod progress;
mod search;
mod types;

// Re-export public API
//
// Configuration types
pub use config::{ExperimentConfig, ExperimentConfigBuilder, SearchConfig, SearchConfigBuilder};
// Cross-validation
pub use cv::{Fold, KFold};
// Error types
pub use error::{LearningError, Result};
// Experiment driver
pub use experiment::{Experiment, ExperimentBuilder};
// Models
pub use gbm::{GbmParams, GradientBoostingRegressor};
pub use model::Regressor;
// Grid types
pub use grid::{ParamGrid, ParamSet, ParamValue};
// Pipeline types
pub use pipeline::{Pipeline, PipelineParams};
// Progress reporting types
pub use progress::{ExperimentStage, ProgressCallback, ProgressUpdate};
// Search
pub use search::{GridSearch, GridSearchBuilder, SearchOutcome};
// Result types
pub use types::{CandidateResult, ExperimentReport};

// Grid search moves pipelines and searches across rayon workers.
static_assertions::assert_impl_all!(Pipeline: Send, Sync);
static_assertions::assert_impl_all!(GradientBoostingRegressor: Send, Sync);
static_assertions::assert_impl_all!(GridSearch: Send, Sync);
static_assertions::assert_impl_all!(Experiment: Send, Sync);
static_assertions::assert_impl_all!(LearningError: Send, Sync);

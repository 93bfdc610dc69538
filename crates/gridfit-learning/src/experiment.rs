//! End-to-end experiment: load, filter, sample, search, predict.
//!
//! [`Experiment`] wires the processing crate's loaders and filters to
//! [`GridSearch`] and writes one prediction per test row.
//!
//! # Stages
//!
//! 1. Load `sample.csv`, `X_train.csv`, `y_train.csv` and `X_test.csv`
//! 2. Drop training rows flagged by Local Outlier Factor
//! 3. Optionally keep ~1% of the remaining rows (debug sample)
//! 4. Cross-validate every grid point and refit the best pipeline
//! 5. Predict the test table and write `id,y` rows
//!
//! # Example
//!
//! ```rust,ignore
//! use gridfit_learning::{Experiment, ExperimentConfig};
//!
//! let report = Experiment::builder()
//!     .config(ExperimentConfig::builder().data_dir("raw").build()?)
//!     .on_progress(|u| println!("[{}] {}", u.stage, u.message))
//!     .build()?
//!     .run()?;
//! println!("best R2: {:.3}", report.best_score);
//! ```

use crate::config::ExperimentConfig;
use crate::error::{LearningError, Result};
use crate::progress::{ExperimentStage, ProgressCallback, ProgressUpdate};
use crate::search::GridSearch;
use crate::types::ExperimentReport;
use chrono::Utc;
use gridfit_processing::{
    DataFiles, ExperimentData, MissingValueProfiler, OutlierFilter, debug_sample,
    write_predictions,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A configured experiment run.
pub struct Experiment {
    config: ExperimentConfig,
    progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for Experiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Experiment")
            .field("config", &self.config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Experiment {
    /// Create a new builder for `Experiment`.
    #[must_use]
    pub fn builder() -> ExperimentBuilder {
        ExperimentBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Run every stage and write the prediction file.
    ///
    /// # Errors
    ///
    /// Any stage error halts the run:
    /// - [`LearningError::Processing`] for unreadable inputs, mismatched row
    ///   counts, a test table lacking a training column or a failed write
    /// - [`LearningError::AllFitsFailed`] if no grid fit succeeded
    /// - Any error from refitting or predicting with the best pipeline
    pub fn run(&self) -> Result<ExperimentReport> {
        let started = Instant::now();
        let config = &self.config;

        self.report(ProgressUpdate::stage(
            ExperimentStage::Loading,
            format!("Loading data from {}", config.data_dir.display()),
        ));
        let data = ExperimentData::load(&DataFiles::in_dir(&config.data_dir))?;
        let train_shape_before_outliers = data.x_train.shape();
        info!(
            "Data shape before outlier detection: {:?}",
            train_shape_before_outliers
        );

        self.report(ProgressUpdate::stage(
            ExperimentStage::OutlierDetection,
            format!(
                "Scoring {} rows with Local Outlier Factor",
                train_shape_before_outliers.0
            ),
        ));
        let filtered = OutlierFilter::new(config.outlier.clone()).apply(&data.x_train, &data.y_train)?;

        let (features, labels, sampling) = if config.debug_sample {
            self.report(ProgressUpdate::stage(
                ExperimentStage::Sampling,
                "Keeping a 1% debug sample",
            ));
            let (x, y, summary) = debug_sample(&filtered.features, &filtered.labels, config.random_seed)?;
            (x, y, Some(summary))
        } else {
            (filtered.features, filtered.labels, None)
        };
        let training_shape = features.shape();
        info!("Training data shape: {:?}", training_shape);

        let test_missing = MissingValueProfiler::profile(&data.x_test);
        for column in &test_missing.columns {
            debug!(
                "Test column {} missing {:.2}%",
                column.column_name, column.percent_missing
            );
        }

        // Test columns follow the training schema; a missing column is an error.
        let x_test = data.x_test.select(&features.column_names())?;
        let x = features.to_matrix()?;
        let y = labels.to_vector()?;

        self.report(ProgressUpdate::stage(
            ExperimentStage::GridSearch,
            "Starting grid search",
        ));
        let search = GridSearch::builder()
            .base_params(config.base_params.clone())
            .param_grid(config.param_grid.clone())
            .config(config.search.clone())
            .progress_callback(self.progress_callback.clone())
            .build()?;
        let outcome = search.fit(&x, &y)?;

        self.report(ProgressUpdate::stage(
            ExperimentStage::Predicting,
            format!("Predicting {} test rows", x_test.height()),
        ));
        let predictions = outcome.best_pipeline.predict(&x_test.to_matrix()?)?;
        if predictions.len() != x_test.height() {
            return Err(LearningError::InvalidData(format!(
                "expected {} predictions, got {}",
                x_test.height(),
                predictions.len()
            )));
        }
        write_predictions(&config.output, x_test.ids(), &predictions)?;
        info!(
            "Wrote {} predictions to {}",
            predictions.len(),
            config.output.display()
        );

        let report = ExperimentReport {
            timestamp: Utc::now(),
            elapsed_seconds: started.elapsed().as_secs_f64(),
            sample_shape: data.sample_shape,
            train_shape_before_outliers,
            outliers: filtered.summary,
            sampling,
            training_shape,
            test_shape: x_test.shape(),
            test_missing,
            n_splits: outcome.n_splits,
            best_index: outcome.best_index,
            best_score: outcome.best_score,
            best_params: outcome.best_params,
            best_pipeline: outcome
                .best_pipeline
                .steps()
                .iter()
                .map(|(stage, name)| (stage.to_string(), name.to_string()))
                .collect(),
            candidates: outcome.results,
            output_path: config.output.clone(),
            n_predictions: predictions.len(),
        };

        self.report(ProgressUpdate {
            stage: ExperimentStage::Complete,
            progress: 1.0,
            message: format!("Finished in {:.1}s", report.elapsed_seconds),
            fits_completed: None,
        });
        Ok(report)
    }

    fn report(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.progress_callback {
            callback(update);
        }
    }
}

/// Builder for [`Experiment`].
///
/// Without [`config()`](Self::config) the default [`ExperimentConfig`] is used.
#[derive(Default)]
pub struct ExperimentBuilder {
    config: Option<ExperimentConfig>,
    progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for ExperimentBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperimentBuilder")
            .field("config", &self.config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ExperimentBuilder {
    /// Set the experiment configuration.
    #[must_use]
    pub fn config(mut self, config: ExperimentConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the progress callback (optional).
    ///
    /// Receives one update per stage and one per finished grid-search fit.
    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Validate the configuration and build the experiment.
    pub fn build(self) -> Result<Experiment> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(Experiment {
            config,
            progress_callback: self.progress_callback,
        })
    }
}

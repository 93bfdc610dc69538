//! Exhaustive cross-validated grid search.
//!
//! This module provides [`GridSearch`] and its builder. A search resolves
//! every grid point against the base [`PipelineParams`], scores each
//! candidate on every fold with R², ranks the candidates by mean score and
//! refits the best pipeline on all rows.
//!
//! # Overview
//!
//! 1. Grid points are resolved when the search is built, so a bad key or
//!    value fails before any model is fitted
//! 2. Folds are cut once and shared by every candidate
//! 3. All `(candidate, fold)` fits run in parallel on a rayon pool sized by
//!    [`SearchConfig::n_jobs`]
//! 4. A failed fit scores `NaN` and is logged; the search fails only when
//!    every fit fails
//!
//! # Example
//!
//! ```rust,ignore
//! use gridfit_learning::{GridSearch, ParamGrid, SearchConfig};
//!
//! let search = GridSearch::builder()
//!     .param_grid(ParamGrid::experiment_default())
//!     .config(SearchConfig::builder().cv_folds(5).build()?)
//!     .on_progress(|u| println!("{:.0}% - {}", u.progress * 100.0, u.message))
//!     .build()?;
//!
//! let outcome = search.fit(&x_train, &y_train)?;
//! println!("best: {} ({:.3})", outcome.best_params, outcome.best_score);
//! ```

use crate::config::SearchConfig;
use crate::error::{LearningError, Result};
use crate::grid::{ParamGrid, ParamSet};
use crate::metrics::r2_score;
use crate::pipeline::{Pipeline, PipelineParams};
use crate::progress::{ExperimentStage, ProgressCallback, ProgressUpdate};
use crate::types::CandidateResult;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// A configured grid search.
///
/// Use [`GridSearch::builder()`] to construct one.
pub struct GridSearch {
    config: SearchConfig,
    candidates: Vec<(ParamSet, PipelineParams)>,
    progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for GridSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridSearch")
            .field("config", &self.config)
            .field("n_candidates", &self.candidates.len())
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

/// Result of a completed search.
#[derive(Debug)]
pub struct SearchOutcome {
    /// One entry per grid point, in grid order.
    pub results: Vec<CandidateResult>,
    pub best_index: usize,
    pub best_params: ParamSet,
    pub best_score: f64,
    /// The best candidate refitted on every row.
    pub best_pipeline: Pipeline,
    pub n_splits: usize,
}

/// Held-out data of one fold, sliced once and shared by every candidate.
struct FoldData {
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_test: Array2<f64>,
    y_test: Array1<f64>,
}

impl GridSearch {
    /// Create a new builder for `GridSearch`.
    #[must_use]
    pub fn builder() -> GridSearchBuilder {
        GridSearchBuilder::default()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Number of grid points that will be evaluated.
    pub fn n_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Cross-validate every candidate on `x`/`y` and refit the best one.
    ///
    /// When no candidate has a finite mean (for instance single-row folds,
    /// where R² is undefined) the first candidate is refit and the best
    /// score is NaN.
    ///
    /// # Errors
    ///
    /// - [`LearningError::InvalidData`] if `x` and `y` differ in length or
    ///   there are fewer rows than folds
    /// - [`LearningError::AllFitsFailed`] if no fit succeeded
    /// - Any error from refitting the best pipeline
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchOutcome> {
        if x.nrows() != y.len() {
            return Err(LearningError::InvalidData(format!(
                "x has {} rows but y has {} values",
                x.nrows(),
                y.len()
            )));
        }

        let folds = self.config.kfold().split(x.nrows())?;
        let fold_data: Vec<FoldData> = folds
            .iter()
            .map(|fold| FoldData {
                x_train: x.select(Axis(0), &fold.train),
                y_train: y.select(Axis(0), &fold.train),
                x_test: x.select(Axis(0), &fold.test),
                y_test: y.select(Axis(0), &fold.test),
            })
            .collect();

        let n_splits = fold_data.len();
        let jobs: Vec<(usize, usize)> = (0..self.candidates.len())
            .flat_map(|c| (0..n_splits).map(move |f| (c, f)))
            .collect();
        let total = jobs.len();

        info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits",
            n_splits,
            self.candidates.len(),
            total
        );
        self.report(ProgressUpdate {
            stage: ExperimentStage::GridSearch,
            progress: 0.0,
            message: format!("Cross-validating {} candidates", self.candidates.len()),
            fits_completed: Some((0, total)),
        });

        let completed = AtomicUsize::new(0);
        let scores: Vec<Result<f64>> = run_in_pool(self.config.n_jobs, || {
            jobs.par_iter()
                .map(|&(c, f)| {
                    let score = evaluate(&self.candidates[c].1, &fold_data[f]);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.report(ProgressUpdate {
                        stage: ExperimentStage::GridSearch,
                        progress: done as f64 / total as f64,
                        message: format!("Fitted {}/{}", done, total),
                        fits_completed: Some((done, total)),
                    });
                    score
                })
                .collect()
        })?;

        let mut fold_scores = vec![Vec::with_capacity(n_splits); self.candidates.len()];
        let mut first_error = None;
        let mut n_failed = 0;
        for (&(c, f), score) in jobs.iter().zip(scores) {
            match score {
                Ok(score) => fold_scores[c].push(score),
                Err(e) => {
                    warn!(
                        "Fit failed for {} on fold {}: {}",
                        self.candidates[c].0, f, e
                    );
                    n_failed += 1;
                    fold_scores[c].push(f64::NAN);
                    first_error.get_or_insert(e);
                }
            }
        }
        if n_failed == total {
            if let Some(first) = first_error {
                return Err(LearningError::AllFitsFailed {
                    total,
                    first: Box::new(first),
                });
            }
        }

        let results = rank(
            self.candidates
                .iter()
                .map(|(point, _)| point.clone())
                .zip(fold_scores)
                .collect(),
        );

        let best_index = best_candidate(&results).unwrap_or_else(|| {
            warn!("No candidate produced a finite score on every fold; refitting the first");
            0
        });
        let best_score = results[best_index].mean_test_score;
        let best_params = results[best_index].params.clone();
        info!("Best candidate {} scored {:.4}", best_params, best_score);

        self.report(ProgressUpdate::stage(
            ExperimentStage::Refit,
            format!("Refitting {} on {} rows", best_params, x.nrows()),
        ));
        let mut best_pipeline = Pipeline::new(self.candidates[best_index].1.clone());
        best_pipeline.fit(x, y)?;

        Ok(SearchOutcome {
            results,
            best_index,
            best_params,
            best_score,
            best_pipeline,
            n_splits,
        })
    }

    fn report(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.progress_callback {
            callback(update);
        }
    }
}

/// Fit a fresh pipeline on the fold's training rows and score the held-out rows.
fn evaluate(params: &PipelineParams, fold: &FoldData) -> Result<f64> {
    let mut pipeline = Pipeline::new(params.clone());
    pipeline.fit(&fold.x_train, &fold.y_train)?;
    let predictions = pipeline.predict(&fold.x_test)?;
    let score = r2_score(&fold.y_test, &predictions);
    debug!("{:?} scored {:.4}", pipeline.steps(), score);
    Ok(score)
}

/// Run `op` on the global pool for `n_jobs == -1`, otherwise on a dedicated
/// pool with `n_jobs` threads.
fn run_in_pool<T, F>(n_jobs: i32, op: F) -> Result<T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    if n_jobs < 1 {
        return Ok(op());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_jobs as usize)
        .build()
        .map_err(|e| LearningError::InvalidConfig(format!("failed to build thread pool: {}", e)))?;
    Ok(pool.install(op))
}

/// Aggregate fold scores and assign min-ranks: tied means share the lowest
/// rank and `NaN` means rank after every finite one.
fn rank(scored: Vec<(ParamSet, Vec<f64>)>) -> Vec<CandidateResult> {
    let mut results: Vec<CandidateResult> = scored
        .into_iter()
        .map(|(params, fold_scores)| {
            let n = fold_scores.len() as f64;
            let mean = fold_scores.iter().sum::<f64>() / n;
            let variance = fold_scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
            CandidateResult {
                params,
                fold_scores,
                mean_test_score: mean,
                std_test_score: variance.sqrt(),
                rank_test_score: 0,
            }
        })
        .collect();

    let means: Vec<f64> = results.iter().map(|r| r.mean_test_score).collect();
    let n_valid = means.iter().filter(|m| !m.is_nan()).count();
    for (result, &mean) in results.iter_mut().zip(&means) {
        result.rank_test_score = if mean.is_nan() {
            n_valid + 1
        } else {
            1 + means.iter().filter(|&&other| other > mean).count()
        };
    }
    results
}

/// First candidate with the highest finite mean score.
fn best_candidate(results: &[CandidateResult]) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.mean_test_score.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, r)| match best {
            Some((_, score)) if score >= r.mean_test_score => best,
            _ => Some((i, r.mean_test_score)),
        })
        .map(|(i, _)| i)
}

/// Builder for [`GridSearch`].
///
/// # Optional Configuration
///
/// - [`base_params()`](Self::base_params): parameters grid points override (default: [`PipelineParams::default`])
/// - [`param_grid()`](Self::param_grid): the grid (default: [`ParamGrid::experiment_default`])
/// - [`config()`](Self::config): folds and parallelism (default: [`SearchConfig::default`])
/// - [`on_progress()`](Self::on_progress): progress callback
#[derive(Default)]
pub struct GridSearchBuilder {
    base_params: Option<PipelineParams>,
    param_grid: Option<ParamGrid>,
    config: Option<SearchConfig>,
    progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for GridSearchBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridSearchBuilder")
            .field("base_params", &self.base_params)
            .field("param_grid", &self.param_grid)
            .field("config", &self.config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl GridSearchBuilder {
    #[must_use]
    pub fn base_params(mut self, params: PipelineParams) -> Self {
        self.base_params = Some(params);
        self
    }

    #[must_use]
    pub fn param_grid(mut self, grid: ParamGrid) -> Self {
        self.param_grid = Some(grid);
        self
    }

    #[must_use]
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the progress callback (optional).
    ///
    /// The callback is invoked from rayon workers once per finished fit.
    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Share an existing callback.
    #[must_use]
    pub fn progress_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress_callback = callback;
        self
    }

    /// Resolve every grid point and build the search.
    ///
    /// # Errors
    ///
    /// - [`LearningError::InvalidConfig`] for an invalid [`SearchConfig`]
    /// - [`LearningError::InvalidParameter`] for a grid point that does not
    ///   resolve against the base parameters
    pub fn build(self) -> Result<GridSearch> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let base = self.base_params.unwrap_or_default();
        let grid = self.param_grid.unwrap_or_else(ParamGrid::experiment_default);
        let candidates = grid
            .candidates()?
            .into_iter()
            .map(|point| {
                let params = base.with_params(&point)?;
                Ok((point, params))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GridSearch {
            config,
            candidates,
            progress_callback: self.progress_callback,
        })
    }
}

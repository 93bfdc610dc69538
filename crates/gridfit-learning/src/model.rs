//! The fit/predict contract for the final pipeline stage.
//!
//! Preprocessing stages implement
//! [`Transformer`](gridfit_processing::Transformer); the estimator at the end
//! of a [`Pipeline`](crate::Pipeline) implements [`Regressor`].
//!
//! # Thread Safety
//!
//! Regressors must be `Send + Sync` so grid search can fit and score
//! candidates on a rayon pool.

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A model mapping a feature matrix to one continuous prediction per row.
///
/// Missing feature values are `NaN`; a regressor must accept them.
pub trait Regressor: Send + Sync + std::fmt::Debug {
    /// Short model name used in logs.
    fn name(&self) -> &'static str;

    /// Fit the model on `x` (rows are samples) and targets `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

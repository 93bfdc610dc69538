//! The fit/transform contract shared by every preprocessing stage.

use crate::error::{ProcessingError, Result};
use ndarray::Array2;

/// A preprocessing stage that learns parameters from data and then maps
/// matrices to matrices.
///
/// Missing values are `NaN` on both sides of the contract. Implementations
/// must be `Send + Sync` so fitted pipelines can be evaluated on a worker pool.
pub trait Transformer: Send + Sync + std::fmt::Debug {
    /// Short stage name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Learn the stage parameters from `x`.
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Apply the learned parameters to `x`.
    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Fit on `x`, then transform it.
    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Fail with [`ProcessingError::ShapeMismatch`] unless `x` has `expected` columns.
pub(crate) fn check_columns(stage: &'static str, x: &Array2<f64>, expected: usize) -> Result<()> {
    if x.ncols() != expected {
        return Err(ProcessingError::ShapeMismatch {
            stage,
            expected,
            found: x.ncols(),
        });
    }
    Ok(())
}

/// Fail with [`ProcessingError::EmptyDataset`] if `x` has no rows.
pub(crate) fn check_non_empty(stage: &'static str, x: &Array2<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(ProcessingError::EmptyDataset(format!(
            "{} cannot be fitted on zero rows",
            stage
        )));
    }
    Ok(())
}

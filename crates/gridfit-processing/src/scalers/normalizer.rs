//! Row-wise L2 normalization.

use crate::error::Result;
use crate::transform::Transformer;
use ndarray::{Array2, Axis};

/// Rescales each row to unit L2 norm.
///
/// Stateless: `fit` learns nothing. Missing entries are left out of the norm
/// and stay missing; rows whose norm is zero are returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct Normalizer;

impl Transformer for Normalizer {
    fn name(&self) -> &'static str {
        "Normalizer"
    }

    fn fit(&mut self, _x: &Array2<f64>) -> Result<()> {
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut out = x.clone();
        for mut row in out.axis_iter_mut(Axis(0)) {
            let norm = row
                .iter()
                .filter(|v| !v.is_nan())
                .map(|v| v * v)
                .sum::<f64>()
                .sqrt();
            if norm > 0.0 && norm.is_finite() {
                row.mapv_inplace(|v| v / norm);
            }
        }
        Ok(out)
    }
}

//! Z-score scaling: `(x - mean) / std` per column.

use super::safe_scale;
use crate::error::{ProcessingError, Result};
use crate::transform::{Transformer, check_columns, check_non_empty};
use crate::utils::{mean, observed, std_dev};
use ndarray::{Array2, Axis};

#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    means: Option<Vec<f64>>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted per-column means.
    pub fn means(&self) -> Option<&[f64]> {
        self.means.as_deref()
    }
}

impl Transformer for StandardScaler {
    fn name(&self) -> &'static str {
        "StandardScaler"
    }

    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        check_non_empty(self.name(), x)?;

        let mut means = Vec::with_capacity(x.ncols());
        let mut scales = Vec::with_capacity(x.ncols());
        for column in x.axis_iter(Axis(1)) {
            let values = observed(column);
            means.push(mean(&values).unwrap_or(0.0));
            scales.push(safe_scale(std_dev(&values).unwrap_or(1.0)));
        }

        self.means = Some(means);
        self.scales = scales;
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let means = self
            .means
            .as_ref()
            .ok_or(ProcessingError::NotFitted("StandardScaler"))?;
        check_columns(self.name(), x, means.len())?;

        let mut out = x.clone();
        for ((mut column, &m), &s) in out
            .axis_iter_mut(Axis(1))
            .zip(means.iter())
            .zip(self.scales.iter())
        {
            column.mapv_inplace(|v| (v - m) / s);
        }
        Ok(out)
    }
}

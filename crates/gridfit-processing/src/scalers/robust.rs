//! Robust scaling: `(x - median) / IQR` per column, IQR between the 25th and 75th percentiles.

use super::safe_scale;
use crate::error::{ProcessingError, Result};
use crate::transform::{Transformer, check_columns, check_non_empty};
use crate::utils::{observed, quantile_sorted, sort_floats};
use ndarray::{Array2, Axis};

#[derive(Debug, Clone, Default)]
pub struct RobustScaler {
    centers: Option<Vec<f64>>,
    scales: Vec<f64>,
}

impl RobustScaler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for RobustScaler {
    fn name(&self) -> &'static str {
        "RobustScaler"
    }

    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        check_non_empty(self.name(), x)?;

        let mut centers = Vec::with_capacity(x.ncols());
        let mut scales = Vec::with_capacity(x.ncols());
        for column in x.axis_iter(Axis(1)) {
            let mut values = observed(column);
            sort_floats(&mut values);

            let center = quantile_sorted(&values, 0.5).unwrap_or(0.0);
            let iqr = match (quantile_sorted(&values, 0.25), quantile_sorted(&values, 0.75)) {
                (Some(q1), Some(q3)) => q3 - q1,
                _ => 1.0,
            };
            centers.push(center);
            scales.push(safe_scale(iqr));
        }

        self.centers = Some(centers);
        self.scales = scales;
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let centers = self
            .centers
            .as_ref()
            .ok_or(ProcessingError::NotFitted("RobustScaler"))?;
        check_columns(self.name(), x, centers.len())?;

        let mut out = x.clone();
        for ((mut column, &c), &s) in out
            .axis_iter_mut(Axis(1))
            .zip(centers.iter())
            .zip(self.scales.iter())
        {
            column.mapv_inplace(|v| (v - c) / s);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_median_and_iqr() {
        // Sorted [1, 2, 3, 4, 100]: median 3, q1 2, q3 4, IQR 2
        let x = array![[1.0], [2.0], [3.0], [4.0], [100.0]];
        let mut scaler = RobustScaler::new();
        let out = scaler.fit_transform(&x).unwrap();
        assert_eq!(out[[2, 0]], 0.0);
        assert_eq!(out[[3, 0]], 0.5);
        assert_eq!(out[[4, 0]], 48.5);
    }

    #[test]
    fn test_nan_preserved() {
        let x = array![[1.0], [f64::NAN], [3.0]];
        let out = RobustScaler::new().fit_transform(&x).unwrap();
        assert!(out[[1, 0]].is_nan());
        assert_eq!(out[[0, 0]], -1.0);
    }

    #[test]
    fn test_constant_column() {
        let x = array![[5.0], [5.0]];
        let out = RobustScaler::new().fit_transform(&x).unwrap();
        assert_eq!(out[[0, 0]], 0.0);
    }
}

//! Scaling stages.
//!
//! Every scaler ignores missing values while fitting and leaves them missing
//! when transforming, so imputation can run after scaling.

mod normalizer;
mod robust;
mod standard;

pub use normalizer::Normalizer;
pub use robust::RobustScaler;
pub use standard::StandardScaler;

use crate::config::ScalerKind;
use crate::error::Result;
use crate::transform::Transformer;
use ndarray::Array2;

/// Identity stage, used when the grid asks for no scaling.
#[derive(Debug, Clone, Default)]
pub struct Passthrough;

impl Transformer for Passthrough {
    fn name(&self) -> &'static str {
        "Passthrough"
    }

    fn fit(&mut self, _x: &Array2<f64>) -> Result<()> {
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(x.clone())
    }
}

impl ScalerKind {
    /// Create an unfitted scaler of this kind.
    pub fn build(&self) -> Box<dyn Transformer> {
        match self {
            ScalerKind::Passthrough => Box::new(Passthrough),
            ScalerKind::Normalizer => Box::new(Normalizer),
            ScalerKind::Standard => Box::new(StandardScaler::new()),
            ScalerKind::Robust => Box::new(RobustScaler::new()),
        }
    }
}

/// Replace a zero (or non-finite) scale by 1.0 so constant columns pass through centred.
pub(crate) fn safe_scale(scale: f64) -> f64 {
    if scale == 0.0 || !scale.is_finite() {
        1.0
    } else {
        scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_passthrough_is_identity() {
        let x = array![[1.0, f64::NAN], [3.0, 4.0]];
        let mut stage = Passthrough;
        let out = stage.fit_transform(&x).unwrap();
        assert_eq!(out[[0, 0]], 1.0);
        assert!(out[[0, 1]].is_nan());
        assert_eq!(out[[1, 1]], 4.0);
    }

    #[test]
    fn test_build_names() {
        let names: Vec<&str> = ScalerKind::ALL.iter().map(|k| k.build().name()).collect();
        assert_eq!(
            names,
            vec!["Passthrough", "Normalizer", "StandardScaler", "RobustScaler"]
        );
    }

    #[test]
    fn test_safe_scale() {
        assert_eq!(safe_scale(0.0), 1.0);
        assert_eq!(safe_scale(f64::NAN), 1.0);
        assert_eq!(safe_scale(2.5), 2.5);
    }
}

//! Regression metrics.

use ndarray::Array1;

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// Fewer than two samples, or mismatched lengths, score NaN. With a constant
/// `y_true` the ratio is undefined; the score is then 1.0 for a perfect
/// prediction and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len();
    if n < 2 || y_pred.len() != n {
        return f64::NAN;
    }

    let mean = y_true.sum() / n as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_prediction() {
        let y = array![1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &y), 1.0);
    }

    #[test]
    fn test_mean_prediction_scores_zero() {
        let y = array![1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &array![2.0, 2.0, 2.0]), 0.0);
    }

    #[test]
    fn test_worse_than_mean_is_negative() {
        let y = array![1.0, 2.0, 3.0];
        // SS_res = 8, SS_tot = 2
        assert_eq!(r2_score(&y, &array![3.0, 2.0, 1.0]), -3.0);
    }

    #[test]
    fn test_constant_target() {
        let y = array![4.0, 4.0];
        assert_eq!(r2_score(&y, &array![4.0, 4.0]), 1.0);
        assert_eq!(r2_score(&y, &array![4.0, 5.0]), 0.0);
    }

    #[test]
    fn test_empty_or_mismatched() {
        assert!(r2_score(&array![], &array![]).is_nan());
        assert!(r2_score(&array![1.0], &array![1.0, 2.0]).is_nan());
    }

    #[test]
    fn test_single_sample_is_undefined() {
        assert!(r2_score(&array![3.0], &array![2.5]).is_nan());
        assert!(r2_score(&array![3.0], &array![3.0]).is_nan());
    }
}

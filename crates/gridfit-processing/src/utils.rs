//! Shared utilities for the processing stages.
//!
//! Numeric helpers here follow one convention: a missing value is `f64::NAN`
//! and statistics are computed over the observed values only.

use ndarray::ArrayView1;
use polars::prelude::*;
use std::cmp::Ordering;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// NaN-aware Statistics
// =============================================================================

/// Collect the observed (non-NaN) values of a column.
pub fn observed(values: ArrayView1<'_, f64>) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0), `None` for an empty slice.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Sort a vector of non-NaN floats in ascending order.
pub fn sort_floats(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Quantile of an ascending slice using linear interpolation between ranks.
///
/// `q` is clamped to `[0, 1]`. Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Median of a slice of observed values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sort_floats(&mut sorted);
    quantile_sorted(&sorted, 0.5)
}

/// Most frequent value; ties resolve to the smallest value.
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sort_floats(&mut sorted);

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let value = sorted[i];
        let mut run = 1;
        while i + run < sorted.len() && sorted[i + run] == value {
            run += 1;
        }
        if best.is_none_or(|(_, count)| run > count) {
            best = Some((value, run));
        }
        i += run;
    }

    best.map(|(value, _)| value)
}

/// Euclidean distance that skips coordinates missing in either row.
///
/// The partial sum is scaled by `n_coords / n_present` so distances over
/// different numbers of observed coordinates stay comparable. Rows without a
/// single shared coordinate are infinitely far apart.
pub fn nan_euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let mut sum = 0.0;
    let mut present = 0usize;
    for (x, y) in a.iter().zip(b.iter()) {
        if x.is_nan() || y.is_nan() {
            continue;
        }
        sum += (x - y).powi(2);
        present += 1;
    }

    if present == 0 {
        return f64::INFINITY;
    }
    (sum * a.len() as f64 / present as f64).sqrt()
}

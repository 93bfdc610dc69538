//! Missing-value profiling.
//!
//! Produces a per-column report of how much of each column is missing, sorted
//! from the most complete column to the least complete one.

use crate::types::IndexedFrame;
use polars::prelude::Column;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Share of missing cells in a single column.
///
/// Nulls and NaN floats both count as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub column_name: String,
    pub null_count: usize,
    /// Percentage in `[0, 100]`.
    pub percent_missing: f64,
}

/// Missing-value report for a whole table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MissingValueReport {
    pub rows: usize,
    /// Sorted ascending by `percent_missing`; ties keep column order.
    pub columns: Vec<ColumnMissing>,
}

impl MissingValueReport {
    /// Percentage of missing cells over the whole table.
    pub fn overall_percent(&self) -> f64 {
        let cells = self.rows * self.columns.len();
        if cells == 0 {
            return 0.0;
        }
        let nulls: usize = self.columns.iter().map(|c| c.null_count).sum();
        nulls as f64 * 100.0 / cells as f64
    }

    /// The column with the highest missing share, if any.
    pub fn worst_column(&self) -> Option<&ColumnMissing> {
        self.columns.last()
    }
}

/// Profiler computing missing-value statistics.
pub struct MissingValueProfiler;

impl MissingValueProfiler {
    /// Profile every value column of `frame`.
    pub fn profile(frame: &IndexedFrame) -> MissingValueReport {
        let rows = frame.height();

        let mut columns: Vec<ColumnMissing> = frame
            .data()
            .get_columns()
            .iter()
            .map(|column| {
                let null_count = missing_count(column);
                let percent_missing = if rows > 0 {
                    null_count as f64 * 100.0 / rows as f64
                } else {
                    0.0
                };
                ColumnMissing {
                    column_name: column.name().to_string(),
                    null_count,
                    percent_missing,
                }
            })
            .collect();

        columns.sort_by(|a, b| a.percent_missing.total_cmp(&b.percent_missing));

        for column in &columns {
            debug!(
                "Column '{}': {:.2}% missing",
                column.column_name, column.percent_missing
            );
        }

        MissingValueReport { rows, columns }
    }
}

/// Nulls plus NaN cells of a float column.
fn missing_count(column: &Column) -> usize {
    let nan_count = if column.dtype().is_float() {
        column
            .as_materialized_series()
            .is_nan()
            .ok()
            .and_then(|mask| mask.sum())
            .unwrap_or(0) as usize
    } else {
        0
    };
    column.null_count() + nan_count
}

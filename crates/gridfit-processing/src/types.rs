//! Core table type shared by the loader, filters and writer.
//!
//! [`IndexedFrame`] keeps the row identifier column apart from the value
//! columns so that numeric stages only ever see feature values, while every
//! row operation (filter, take, select) keeps identifiers and values aligned.

use crate::error::{ProcessingError, Result};
use crate::utils::is_numeric_dtype;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use tracing::debug;

/// A table whose rows are keyed by an identifier column.
#[derive(Debug, Clone)]
pub struct IndexedFrame {
    index_name: String,
    ids: Column,
    data: DataFrame,
}

impl IndexedFrame {
    /// Split `df` into its identifier column `index_col` and value columns.
    pub fn from_dataframe(df: DataFrame, index_col: &str) -> Result<Self> {
        let ids = df
            .column(index_col)
            .map_err(|_| ProcessingError::ColumnNotFound(index_col.to_string()))?
            .clone();
        let data = df.drop(index_col)?;

        if data.width() == 0 {
            return Err(ProcessingError::InvalidData(format!(
                "table has no columns besides the index '{}'",
                index_col
            )));
        }

        Ok(Self {
            index_name: index_col.to_string(),
            ids,
            data,
        })
    }

    /// Name of the identifier column.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Row identifiers, in row order.
    pub fn ids(&self) -> &Column {
        &self.ids
    }

    /// Value columns (identifier excluded).
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn height(&self) -> usize {
        self.ids.len()
    }

    pub fn width(&self) -> usize {
        self.data.width()
    }

    /// `(rows, value columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Whether both tables carry identical identifiers in identical order.
    pub fn same_ids(&self, other: &IndexedFrame) -> bool {
        self.ids
            .as_materialized_series()
            .equals(other.ids.as_materialized_series())
    }

    /// Convert the value columns to a dense row-major matrix.
    ///
    /// Nulls and cells that cannot be cast to a float become `NaN`.
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        let mut matrix = Array2::from_elem(self.shape(), f64::NAN);

        for (col_idx, column) in self.data.get_columns().iter().enumerate() {
            if !is_numeric_dtype(column.dtype()) {
                debug!(
                    "Column '{}' has dtype {}; non-numeric cells become missing",
                    column.name(),
                    column.dtype()
                );
            }

            let float_series = column
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let values = float_series.f64()?;

            for (row_idx, value) in values.into_iter().enumerate() {
                matrix[[row_idx, col_idx]] = value.unwrap_or(f64::NAN);
            }
        }

        Ok(matrix)
    }

    /// Convert the first value column to a vector (the label of a label table).
    pub fn to_vector(&self) -> Result<Array1<f64>> {
        let column = self.data.get_columns().first().ok_or_else(|| {
            ProcessingError::InvalidData("table has no value column".to_string())
        })?;
        let float_series = column.as_materialized_series().cast(&DataType::Float64)?;
        let values = float_series.f64()?;

        Ok(values
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Keep the rows where `mask` is `true`, by position.
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.height() {
            return Err(ProcessingError::InvalidData(format!(
                "mask has {} entries but table has {} rows",
                mask.len(),
                self.height()
            )));
        }

        let mask = BooleanChunked::from_slice("mask".into(), mask);
        let ids = self.ids.as_materialized_series().filter(&mask)?;

        Ok(Self {
            index_name: self.index_name.clone(),
            ids: Column::from(ids),
            data: self.data.filter(&mask)?,
        })
    }

    /// Gather the rows at `indices`, in the given order.
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&out_of_range) = indices.iter().find(|&&i| i >= self.height()) {
            return Err(ProcessingError::InvalidData(format!(
                "row index {} out of range for {} rows",
                out_of_range,
                self.height()
            )));
        }

        let idx = IdxCa::from_vec(
            "idx".into(),
            indices.iter().map(|&i| i as IdxSize).collect(),
        );
        let ids = self.ids.as_materialized_series().take(&idx)?;

        Ok(Self {
            index_name: self.index_name.clone(),
            ids: Column::from(ids),
            data: self.data.take(&idx)?,
        })
    }

    /// Restrict and reorder the value columns to `columns`.
    pub fn select(&self, columns: &[String]) -> Result<Self> {
        let available = self.column_names();
        if let Some(missing) = columns.iter().find(|c| !available.contains(c)) {
            return Err(ProcessingError::ColumnNotFound(missing.clone()));
        }

        Ok(Self {
            index_name: self.index_name.clone(),
            ids: self.ids.clone(),
            data: self.data.select(columns.iter().map(|c| c.as_str()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> IndexedFrame {
        let df = df![
            "id" => [10i64, 11, 12, 13],
            "a" => [Some(1.0), None, Some(3.0), Some(4.0)],
            "b" => [5i64, 6, 7, 8],
        ]
        .unwrap();
        IndexedFrame::from_dataframe(df, "id").unwrap()
    }

    fn ids_of(frame: &IndexedFrame) -> Vec<i64> {
        frame
            .ids()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn test_from_dataframe_splits_index() {
        let frame = sample_frame();
        assert_eq!(frame.shape(), (4, 2));
        assert_eq!(frame.index_name(), "id");
        assert_eq!(frame.column_names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_from_dataframe_missing_index() {
        let df = df!["a" => [1.0, 2.0]].unwrap();
        let err = IndexedFrame::from_dataframe(df, "id").unwrap_err();
        assert!(matches!(err, ProcessingError::ColumnNotFound(_)));
    }

    #[test]
    fn test_from_dataframe_index_only() {
        let df = df!["id" => [1i64, 2]].unwrap();
        assert!(IndexedFrame::from_dataframe(df, "id").is_err());
    }

    #[test]
    fn test_to_matrix_marks_nulls_as_nan() {
        let matrix = sample_frame().to_matrix().unwrap();
        assert_eq!(matrix.dim(), (4, 2));
        assert!(matrix[[1, 0]].is_nan());
        assert_eq!(matrix[[2, 1]], 7.0);
    }

    #[test]
    fn test_to_matrix_unparsable_strings_become_nan() {
        let df = df![
            "id" => [1i64, 2],
            "s" => ["1.5", "oops"],
        ]
        .unwrap();
        let frame = IndexedFrame::from_dataframe(df, "id").unwrap();
        let matrix = frame.to_matrix().unwrap();
        assert_eq!(matrix[[0, 0]], 1.5);
        assert!(matrix[[1, 0]].is_nan());
    }

    #[test]
    fn test_filter_keeps_ids_aligned() {
        let frame = sample_frame();
        let filtered = frame.filter(&[true, false, true, false]).unwrap();
        assert_eq!(filtered.height(), 2);
        assert_eq!(ids_of(&filtered), vec![10, 12]);
        assert_eq!(filtered.to_matrix().unwrap()[[1, 1]], 7.0);
    }

    #[test]
    fn test_filter_rejects_wrong_mask_length() {
        assert!(sample_frame().filter(&[true, false]).is_err());
    }

    #[test]
    fn test_take_reorders_rows() {
        let taken = sample_frame().take(&[3, 0]).unwrap();
        assert_eq!(ids_of(&taken), vec![13, 10]);
        assert!(sample_frame().take(&[4]).is_err());
    }

    #[test]
    fn test_select_reorders_columns() {
        let frame = sample_frame();
        let selected = frame.select(&["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(selected.column_names(), vec!["b".to_string(), "a".to_string()]);

        let err = frame.select(&["zzz".to_string()]).unwrap_err();
        assert!(matches!(err, ProcessingError::ColumnNotFound(_)));
    }

    #[test]
    fn test_same_ids() {
        let frame = sample_frame();
        assert!(frame.same_ids(&frame.clone()));
        assert!(!frame.same_ids(&frame.take(&[1, 0, 2, 3]).unwrap()));
    }
}

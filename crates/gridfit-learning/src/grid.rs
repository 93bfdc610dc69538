//! Parameter grids for exhaustive search.
//!
//! A [`ParamGrid`] is a list of sub-grids. Each sub-grid maps a parameter path
//! to the values to try; its candidates are the Cartesian product of those
//! lists, and the grid's candidates are the sub-grids' candidates in order.
//!
//! Within a sub-grid keys are iterated in sorted order and the last key varies
//! fastest, so the order of candidates is reproducible.
//!
//! # Example
//!
//! ```
//! use gridfit_learning::{ParamGrid, ParamValue};
//!
//! let grid = ParamGrid::new()
//!     .with_sub_grid([
//!         ("scale", vec![ParamValue::from("standard"), ParamValue::from("robust")]),
//!         ("estimation__max_depth", vec![ParamValue::from(3), ParamValue::from(6)]),
//!     ]);
//! assert_eq!(grid.len(), 4);
//! ```

use crate::error::{LearningError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One candidate value of a grid parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Numeric view of the value; strings are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Str(_) => None,
        }
    }

    /// Non-negative integer view; floats qualify only when integral.
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ParamValue::Int(v) => usize::try_from(*v).ok(),
            ParamValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 && v.is_finite() => {
                Some(*v as usize)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// One point of a grid: a value for each parameter path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet(BTreeMap<String, ParamValue>);

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(path.into(), value.into());
    }

    pub fn get(&self, path: &str) -> Option<&ParamValue> {
        self.0.get(path)
    }

    /// Entries in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        f.write_str("}")
    }
}

/// A union of sub-grids, each a map from parameter path to candidate values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamGrid {
    sub_grids: Vec<BTreeMap<String, Vec<ParamValue>>>,
}

impl ParamGrid {
    /// An empty grid. It yields a single empty candidate (the base parameters).
    pub fn new() -> Self {
        Self::default()
    }

    /// The grid searched by a default experiment: every scaler except
    /// passthrough crossed with every imputation strategy, with the
    /// regressor at depth 6, gamma 0 and min_child_weight 1.
    pub fn experiment_default() -> Self {
        Self::new().with_sub_grid([
            (
                "scale",
                vec!["normalizer".into(), "standard".into(), "robust".into()],
            ),
            (
                "impute__strategy",
                vec!["mean".into(), "median".into(), "most_frequent".into()],
            ),
            ("estimation__max_depth", vec![6.into()]),
            ("estimation__gamma", vec![0.into()]),
            ("estimation__min_child_weight", vec![1.into()]),
        ])
    }

    /// Append a sub-grid.
    #[must_use]
    pub fn with_sub_grid<K, I>(mut self, entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Vec<ParamValue>)>,
    {
        self.sub_grids
            .push(entries.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    pub fn sub_grids(&self) -> &[BTreeMap<String, Vec<ParamValue>>] {
        &self.sub_grids
    }

    /// Total number of candidates.
    pub fn len(&self) -> usize {
        if self.sub_grids.is_empty() {
            return 1;
        }
        self.sub_grids
            .iter()
            .map(|grid| grid.values().map(Vec::len).product::<usize>())
            .sum()
    }

    /// A grid always yields at least one candidate.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand the grid into its candidates.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidParameter`] if a key has no values.
    pub fn candidates(&self) -> Result<Vec<ParamSet>> {
        if self.sub_grids.is_empty() {
            return Ok(vec![ParamSet::new()]);
        }

        let mut candidates = Vec::with_capacity(self.len());
        for grid in &self.sub_grids {
            if let Some((key, _)) = grid.iter().find(|(_, values)| values.is_empty()) {
                return Err(LearningError::invalid_parameter(
                    key,
                    "parameter grid values must be a non-empty list",
                ));
            }

            let mut points = vec![ParamSet::new()];
            for (key, values) in grid {
                points = points
                    .into_iter()
                    .flat_map(|point| {
                        values.iter().map(move |value| {
                            let mut next = point.clone();
                            next.insert(key.clone(), value.clone());
                            next
                        })
                    })
                    .collect();
            }
            candidates.extend(points);
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_grid_has_nine_candidates() {
        let grid = ParamGrid::experiment_default();
        assert_eq!(grid.len(), 9);
        assert_eq!(grid.candidates().unwrap().len(), 9);
    }

    #[test]
    fn test_last_key_varies_fastest() {
        let grid = ParamGrid::new().with_sub_grid([
            ("b", vec![1.into(), 2.into()]),
            ("a", vec!["x".into(), "y".into()]),
        ]);
        let rendered: Vec<String> = grid
            .candidates()
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "{a: x, b: 1}",
                "{a: x, b: 2}",
                "{a: y, b: 1}",
                "{a: y, b: 2}",
            ]
        );
    }

    #[test]
    fn test_sub_grids_are_unioned_in_order() {
        let grid = ParamGrid::new()
            .with_sub_grid([("scale", vec!["standard".into()])])
            .with_sub_grid([
                ("scale", vec!["robust".into()]),
                ("estimation__max_depth", vec![2.into(), 4.into(), 8.into()]),
            ]);
        let candidates = grid.candidates().unwrap();
        assert_eq!(grid.len(), 4);
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0].to_string(), "{scale: standard}");
        assert_eq!(
            candidates[3].get("estimation__max_depth"),
            Some(&ParamValue::Int(8))
        );
    }

    #[test]
    fn test_empty_value_list_rejected() {
        let grid = ParamGrid::new().with_sub_grid([("scale", Vec::new())]);
        let err = grid.candidates().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_empty_grid_yields_base_candidate() {
        let grid = ParamGrid::new();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.candidates().unwrap(), vec![ParamSet::new()]);
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"[{"scale": ["standard", "robust"], "estimation__learning_rate": [0.1, 0.3], "estimation__max_depth": [4]}]"#;
        let grid: ParamGrid = serde_json::from_str(json).unwrap();
        assert_eq!(grid.len(), 4);
        let first = &grid.candidates().unwrap()[0];
        assert_eq!(first.get("estimation__learning_rate"), Some(&ParamValue::Float(0.1)));
        assert_eq!(first.get("estimation__max_depth"), Some(&ParamValue::Int(4)));
    }

    #[test]
    fn test_value_views() {
        assert_eq!(ParamValue::Float(3.0).as_usize(), Some(3));
        assert_eq!(ParamValue::Float(3.5).as_usize(), None);
        assert_eq!(ParamValue::Int(-1).as_usize(), None);
        assert_eq!(ParamValue::from("x").as_f64(), None);
        assert_eq!(ParamValue::Int(2).as_f64(), Some(2.0));
    }
}

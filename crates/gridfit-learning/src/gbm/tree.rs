//! Regression trees grown on gradient statistics.
//!
//! Split finding is exact and greedy: for each feature the node's rows are
//! visited in ascending value order and every boundary between distinct
//! values is scored with the second-order loss reduction
//! `GL²/(HL+λ) + GR²/(HR+λ) - G²/(H+λ)`, with `G` soft-thresholded by
//! `alpha`; a split is kept only when it exceeds `gamma`. Rows whose value is
//! missing always go to the right child.

use super::GbmParams;
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub(crate) fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        match self {
            Node::Leaf { weight } => *weight,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                // NaN fails the comparison and goes right
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Row positions of every feature's observed values, ascending by value.
///
/// Missing values are left out. Computed once per fit and narrowed as the
/// tree grows, so no node sorts again.
pub(crate) fn presort(x: &Array2<f64>) -> Vec<Vec<usize>> {
    (0..x.ncols())
        .into_par_iter()
        .map(|f| {
            let column = x.column(f);
            let mut rows: Vec<usize> = (0..x.nrows()).filter(|&i| !column[i].is_nan()).collect();
            rows.sort_by(|&a, &b| {
                column[a]
                    .partial_cmp(&column[b])
                    .unwrap_or(Ordering::Equal)
                    .then(a.cmp(&b))
            });
            rows
        })
        .collect()
}

/// Grows one tree for the given gradients and hessians.
pub(crate) struct TreeBuilder<'a> {
    pub x: &'a Array2<f64>,
    pub grad: &'a [f64],
    pub hess: &'a [f64],
    pub params: &'a GbmParams,
}

impl TreeBuilder<'_> {
    pub(crate) fn build(&self, sorted: Vec<Vec<usize>>) -> Node {
        let rows: Vec<usize> = (0..self.x.nrows()).collect();
        self.grow(rows, sorted, 0)
    }

    fn grow(&self, rows: Vec<usize>, sorted: Vec<Vec<usize>>, depth: usize) -> Node {
        let g_sum: f64 = rows.iter().map(|&i| self.grad[i]).sum();
        let h_sum: f64 = rows.iter().map(|&i| self.hess[i]).sum();
        let leaf = Node::Leaf {
            weight: leaf_weight(g_sum, h_sum, self.params),
        };

        if depth >= self.params.max_depth || rows.len() < 2 || h_sum < self.params.min_child_weight {
            return leaf;
        }

        let best = sorted
            .par_iter()
            .enumerate()
            .filter_map(|(feature, order)| {
                self.best_split(feature, order, rows.len(), g_sum, h_sum)
            })
            .max_by(|a, b| {
                a.gain
                    .total_cmp(&b.gain)
                    .then_with(|| b.feature.cmp(&a.feature))
            });

        let Some(split) = best.filter(|s| s.gain > self.params.gamma) else {
            return leaf;
        };

        let mut goes_left = vec![false; self.x.nrows()];
        for &i in &rows {
            goes_left[i] = self.x[[i, split.feature]] <= split.threshold;
        }
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&i| goes_left[i]);
        if left_rows.is_empty() || right_rows.is_empty() {
            return leaf;
        }

        let (left_sorted, right_sorted): (Vec<Vec<usize>>, Vec<Vec<usize>>) = sorted
            .into_iter()
            .map(|order| -> (Vec<usize>, Vec<usize>) {
                order.into_iter().partition(|&i| goes_left[i])
            })
            .unzip();

        let (left, right) = rayon::join(
            || self.grow(left_rows, left_sorted, depth + 1),
            || self.grow(right_rows, right_sorted, depth + 1),
        );

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Best boundary for one feature. `order` holds the node's observed rows
    /// for that feature; the remaining `n_rows - order.len()` rows are missing
    /// and counted on the right.
    fn best_split(
        &self,
        feature: usize,
        order: &[usize],
        n_rows: usize,
        g_total: f64,
        h_total: f64,
    ) -> Option<SplitCandidate> {
        let has_missing = order.len() < n_rows;
        let parent_score = score(g_total, h_total, self.params);
        let min_child = self.params.min_child_weight;

        let mut g_left = 0.0;
        let mut h_left = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for (pos, &i) in order.iter().enumerate() {
            g_left += self.grad[i];
            h_left += self.hess[i];
            let value = self.x[[i, feature]];

            let threshold = match order.get(pos + 1) {
                Some(&next) => {
                    let next_value = self.x[[next, feature]];
                    if next_value == value {
                        continue;
                    }
                    let mid = value + (next_value - value) / 2.0;
                    // Adjacent floats can round the midpoint up to `next_value`
                    if mid >= next_value { value } else { mid }
                }
                // Only the missing rows would go right
                None if has_missing => value,
                None => break,
            };

            let g_right = g_total - g_left;
            let h_right = h_total - h_left;
            if h_left < min_child || h_right < min_child {
                continue;
            }

            // Loss reduction, compared directly against `gamma` (min_split_loss)
            let gain = score(g_left, h_left, self.params) + score(g_right, h_right, self.params)
                - parent_score;
            if best.is_none_or(|b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    gain,
                });
            }
        }

        best
    }
}

fn threshold_l1(g: f64, alpha: f64) -> f64 {
    if g > alpha {
        g - alpha
    } else if g < -alpha {
        g + alpha
    } else {
        0.0
    }
}

fn score(g: f64, h: f64, params: &GbmParams) -> f64 {
    let g = threshold_l1(g, params.reg_alpha);
    g * g / (h + params.reg_lambda)
}

/// Optimal leaf weight `-T(G, alpha) / (H + lambda)`.
pub(crate) fn leaf_weight(g: f64, h: f64, params: &GbmParams) -> f64 {
    let denominator = h + params.reg_lambda;
    if denominator <= 0.0 {
        return 0.0;
    }
    -threshold_l1(g, params.reg_alpha) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn build(x: &Array2<f64>, grad: &[f64], params: &GbmParams) -> Node {
        let hess = vec![1.0; grad.len()];
        TreeBuilder {
            x,
            grad,
            hess: &hess,
            params,
        }
        .build(presort(x))
    }

    #[test]
    fn test_presort_skips_missing() {
        let x = array![[3.0], [f64::NAN], [1.0], [2.0]];
        assert_eq!(presort(&x), vec![vec![2, 3, 0]]);
    }

    #[test]
    fn test_single_split_separates_groups() {
        let x = array![[1.0], [2.0], [10.0], [11.0]];
        let grad = [1.0, 1.0, -1.0, -1.0];
        let params = GbmParams {
            reg_lambda: 0.0,
            ..Default::default()
        };
        let tree = build(&x, &grad, &params);

        match &tree {
            Node::Split { threshold, .. } => assert_eq!(*threshold, 6.0),
            Node::Leaf { .. } => panic!("expected a split"),
        }
        assert_eq!(tree.predict(x.row(0)), -1.0);
        assert_eq!(tree.predict(x.row(3)), 1.0);
    }

    #[test]
    fn test_missing_values_go_right() {
        let x = array![[1.0], [2.0], [f64::NAN], [f64::NAN]];
        let grad = [1.0, 1.0, -1.0, -1.0];
        let params = GbmParams {
            reg_lambda: 0.0,
            ..Default::default()
        };
        let tree = build(&x, &grad, &params);

        assert_eq!(tree.predict(x.row(0)), -1.0);
        assert_eq!(tree.predict(x.row(2)), 1.0);
        assert_eq!(tree.predict(array![100.0].view()), 1.0);
    }

    #[test]
    fn test_depth_limit() {
        let x = Array2::from_shape_fn((64, 1), |(i, _)| i as f64);
        let grad: Vec<f64> = (0..64).map(|i| ((i * 7) % 13) as f64 - 6.0).collect();
        let params = GbmParams {
            max_depth: 2,
            ..Default::default()
        };
        assert!(build(&x, &grad, &params).depth() <= 2);
    }

    #[test]
    fn test_gamma_blocks_weak_splits() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let grad = [0.1, 0.1, -0.1, -0.1];
        let params = GbmParams {
            gamma: 10.0,
            ..Default::default()
        };
        assert!(matches!(build(&x, &grad, &params), Node::Leaf { .. }));
    }

    #[test]
    fn test_gamma_is_compared_to_full_loss_reduction() {
        // Children score 4/3 each, parent 0: loss reduction 8/3 clears gamma = 2
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let grad = [1.0, 1.0, -1.0, -1.0];
        let params = GbmParams {
            gamma: 2.0,
            ..Default::default()
        };
        let tree = build(&x, &grad, &params);
        match &tree {
            Node::Split { threshold, .. } => assert_eq!(*threshold, 2.5),
            Node::Leaf { .. } => panic!("expected a split"),
        }

        let params = GbmParams {
            gamma: 3.0,
            ..Default::default()
        };
        assert!(matches!(build(&x, &grad, &params), Node::Leaf { .. }));
    }

    #[test]
    fn test_threshold_between_adjacent_floats() {
        let low = 1.0 + f64::EPSILON;
        let high = 1.0 + 2.0 * f64::EPSILON;
        let x = array![[low], [low], [high], [high]];
        let grad = [1.0, 1.0, -1.0, -1.0];
        let params = GbmParams {
            reg_lambda: 0.0,
            ..Default::default()
        };
        let tree = build(&x, &grad, &params);

        assert!(matches!(tree, Node::Split { .. }));
        assert_eq!(tree.predict(x.row(0)), -1.0);
        assert_eq!(tree.predict(x.row(2)), 1.0);
    }

    #[test]
    fn test_min_child_weight_blocks_small_children() {
        let x = array![[1.0], [2.0], [3.0]];
        let grad = [5.0, -1.0, -1.0];
        let params = GbmParams {
            min_child_weight: 2.0,
            ..Default::default()
        };
        // Either child of any split would hold a single row
        assert!(matches!(build(&x, &grad, &params), Node::Leaf { .. }));
    }

    #[test]
    fn test_leaf_weight_regularization() {
        let params = GbmParams {
            reg_lambda: 1.0,
            reg_alpha: 0.5,
            ..Default::default()
        };
        assert_eq!(leaf_weight(-3.0, 4.0, &params), 0.5);
        assert_eq!(leaf_weight(0.2, 4.0, &params), 0.0);
    }
}

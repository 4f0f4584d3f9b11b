//! Gradient-boosted regression trees (squared loss).
//!
//! Each round fits one tree to the current residuals with leaf-wise growth:
//! the leaf whose best split has the largest gain is split next, until the
//! tree reaches `num_leaves` or no split clears the constraints. Leaf values
//! are `sum(residual) / (count + reg_lambda)` scaled by the learning rate.
//!
//! Every round draws a column subsample from a seeded `StdRng`. Row bagging
//! is off unless `subsample_freq > 0`; then a fresh bag of `subsample` rows
//! is drawn every `subsample_freq` rounds and reused in between. A fit is a
//! pure function of (data, config).
//!
//! Split search runs over per-feature row orderings computed once per fit.
//! A node scans the full ordering and skips rows that belong elsewhere,
//! which is linear in the training size per feature and node.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ModelConfig;

use super::error::{EngineError, EngineResult};

/// Minimum gain a split must exceed to be taken.
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single regression tree. Rows with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

/// Best split found for one leaf.
#[derive(Debug, Clone, Copy)]
struct SplitInfo {
    feature: usize,
    threshold: f64,
    gain: f64,
    left_count: usize,
    left_sum: f64,
}

/// A leaf under construction.
#[derive(Debug, Clone, Copy)]
struct LeafState {
    node: usize,
    depth: usize,
    count: usize,
    sum: f64,
    best: Option<SplitInfo>,
}

/// Grows one tree on a fixed residual vector.
struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    sorted: &'a [Vec<usize>],
    residuals: &'a [f64],
    features: &'a [usize],
    config: &'a ModelConfig,
    /// Node each in-bag row currently sits in; `None` = out of bag
    node_of: Vec<Option<usize>>,
}

impl<'a> TreeBuilder<'a> {
    fn grow(mut self) -> RegressionTree {
        let (count, sum) = self
            .node_of
            .iter()
            .zip(self.residuals)
            .filter(|(n, _)| n.is_some())
            .fold((0usize, 0.0), |(c, s), (_, r)| (c + 1, s + r));

        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut leaves = vec![self.leaf_state(0, 0, count, sum)];

        while leaves.len() < self.config.num_leaves {
            // Leaf with the largest gain; earliest leaf wins ties
            let mut pick: Option<(usize, f64)> = None;
            for (i, leaf) in leaves.iter().enumerate() {
                if let Some(split) = leaf.best {
                    if pick.map_or(true, |(_, g)| split.gain > g) {
                        pick = Some((i, split.gain));
                    }
                }
            }
            let Some((leaf_idx, _)) = pick else {
                break;
            };

            let parent = leaves.remove(leaf_idx);
            let Some(split) = parent.best else {
                break;
            };
            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[parent.node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            for (row, slot) in self.node_of.iter_mut().enumerate() {
                if *slot == Some(parent.node) {
                    *slot = Some(if self.x[row][split.feature] <= split.threshold {
                        left
                    } else {
                        right
                    });
                }
            }

            let depth = parent.depth + 1;
            let left_leaf = self.leaf_state(left, depth, split.left_count, split.left_sum);
            let right_leaf = self.leaf_state(
                right,
                depth,
                parent.count - split.left_count,
                parent.sum - split.left_sum,
            );
            leaves.insert(leaf_idx, right_leaf);
            leaves.insert(leaf_idx, left_leaf);
        }

        for leaf in &leaves {
            let value =
                self.config.learning_rate * leaf.sum / (leaf.count as f64 + self.config.reg_lambda);
            nodes[leaf.node] = Node::Leaf { value };
        }
        RegressionTree { nodes }
    }

    fn leaf_state(&self, node: usize, depth: usize, count: usize, sum: f64) -> LeafState {
        let depth_ok = self.config.max_depth.map_or(true, |max| depth < max);
        let best = if depth_ok && count >= 2 * self.config.min_child_samples {
            self.best_split(node, count, sum)
        } else {
            None
        };
        LeafState {
            node,
            depth,
            count,
            sum,
            best,
        }
    }

    fn best_split(&self, node: usize, count: usize, sum: f64) -> Option<SplitInfo> {
        let lambda = self.config.reg_lambda;
        let min_child = self.config.min_child_samples;
        let parent_score = sum * sum / (count as f64 + lambda);
        let mut best: Option<SplitInfo> = None;

        for &feature in self.features {
            let mut left_count = 0usize;
            let mut left_sum = 0.0;
            let mut prev: Option<f64> = None;

            for &row in &self.sorted[feature] {
                if self.node_of[row] != Some(node) {
                    continue;
                }
                let value = self.x[row][feature];
                if let Some(prev_value) = prev {
                    let right_count = count - left_count;
                    if value > prev_value && left_count >= min_child && right_count >= min_child {
                        let right_sum = sum - left_sum;
                        let gain = left_sum * left_sum / (left_count as f64 + lambda)
                            + right_sum * right_sum / (right_count as f64 + lambda)
                            - parent_score;
                        if gain > MIN_SPLIT_GAIN && best.map_or(true, |b| gain > b.gain) {
                            best = Some(SplitInfo {
                                feature,
                                threshold: prev_value + (value - prev_value) / 2.0,
                                gain,
                                left_count,
                                left_sum,
                            });
                        }
                    }
                }
                left_count += 1;
                left_sum += self.residuals[row];
                prev = Some(value);
            }
        }
        best
    }
}

/// Fitted boosted ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostedTrees {
    base_score: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    /// Fit on row-major `x` against `y`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &ModelConfig) -> EngineResult<Self> {
        if x.is_empty() {
            return Err(EngineError::DataValidation(
                "cannot fit ensemble on zero rows".to_string(),
            ));
        }
        if x.len() != y.len() {
            return Err(EngineError::DataValidation(format!(
                "feature rows ({}) and targets ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if let Some(i) = x.iter().position(|row| row.len() != n_features) {
            return Err(EngineError::DataValidation(format!(
                "row {i} has {} features, expected {n_features}",
                x[i].len()
            )));
        }
        if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
            return Err(EngineError::DataValidation(
                "non-finite value in training matrix".to_string(),
            ));
        }

        let n = x.len();
        let sorted: Vec<Vec<usize>> = (0..n_features)
            .map(|f| {
                let mut order: Vec<usize> = (0..n).collect();
                order.sort_by(|&a, &b| x[a][f].total_cmp(&x[b][f]));
                order
            })
            .collect();

        let base_score = y.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base_score; n];
        let mut residuals = vec![0.0; n];
        let mut rng = StdRng::seed_from_u64(config.seed);

        let bag_size = fraction_of(n, config.subsample);
        let bagging = config.subsample_freq > 0 && bag_size < n;
        let col_size = fraction_of(n_features, config.colsample_bytree);
        let mut bag: Vec<Option<usize>> = vec![Some(0); n];

        let mut trees = Vec::with_capacity(config.n_estimators);
        for round in 0..config.n_estimators {
            for ((r, &target), &pred) in residuals.iter_mut().zip(y).zip(&predictions) {
                *r = target - pred;
            }

            if bagging && round % config.subsample_freq == 0 {
                bag.fill(None);
                for row in rand::seq::index::sample(&mut rng, n, bag_size).into_vec() {
                    bag[row] = Some(0);
                }
            }

            let mut features: Vec<usize> = if col_size < n_features {
                rand::seq::index::sample(&mut rng, n_features, col_size).into_vec()
            } else {
                (0..n_features).collect()
            };
            features.sort_unstable();

            let tree = TreeBuilder {
                x,
                sorted: &sorted,
                residuals: &residuals,
                features: &features,
                config,
                node_of: bag.clone(),
            }
            .grow();

            for (pred, row) in predictions.iter_mut().zip(x) {
                *pred += tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            base_score,
            n_features,
            trees,
        })
    }

    /// Predict one encoded row.
    pub fn predict(&self, x: &[f64]) -> EngineResult<f64> {
        if x.len() != self.n_features {
            return Err(EngineError::Prediction(format!(
                "expected {} features, got {}",
                self.n_features,
                x.len()
            )));
        }
        let value = self.base_score + self.trees.iter().map(|t| t.predict(x)).sum::<f64>();
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EngineError::Prediction(format!("ensemble produced {value}")))
        }
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// `round(total * fraction)` clamped to `[1, total]`.
fn fraction_of(total: usize, fraction: f64) -> usize {
    ((total as f64 * fraction).round() as usize).clamp(1, total.max(1))
}

//! CART regression tree (squared-error splits)

use crate::prepare::FeatureMatrix;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth (`None` grows until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

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

/// Best split found at a node
struct Candidate {
    feature: usize,
    /// Number of samples going left after sorting by `feature`
    position: usize,
    threshold: f64,
    score: f64,
}

/// Regression tree stored as a flat node arena (root at index 0)
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    params: TreeParams,
}

impl RegressionTree {
    /// Grow a tree on the given sample indices (duplicates allowed, as
    /// produced by bootstrap sampling)
    ///
    /// `samples` must be non-empty and index rows of `x` and `y`.
    #[must_use]
    pub fn fit(x: &FeatureMatrix, y: &[f64], mut samples: Vec<usize>, params: TreeParams) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            params,
        };
        if samples.is_empty() {
            tree.nodes.push(Node::Leaf { value: 0.0 });
        } else {
            tree.grow(x, y, &mut samples, 0);
        }
        tree
    }

    /// Number of nodes (leaves included)
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Predict one row
    #[must_use]
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn grow(&mut self, x: &FeatureMatrix, y: &[f64], samples: &mut [usize], depth: usize) -> usize {
        let n = samples.len();
        let mean = samples.iter().map(|&s| y[s]).sum::<f64>() / n as f64;
        let sse: f64 = samples.iter().map(|&s| (y[s] - mean).powi(2)).sum();

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        let too_small = n < self.params.min_samples_split.max(2 * self.params.min_samples_leaf);

        let candidate = if depth_reached || too_small || sse <= f64::EPSILON {
            None
        } else {
            self.best_split(x, y, samples)
        };

        let Some(split) = candidate else {
            self.nodes.push(Node::Leaf { value: mean });
            return self.nodes.len() - 1;
        };

        // Reorder so the first `position` samples go left
        sort_by_feature(x, samples, split.feature);
        let (left_samples, right_samples) = samples.split_at_mut(split.position);

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });
        let left = self.grow(x, y, left_samples, depth + 1);
        let right = self.grow(x, y, right_samples, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    /// Maximize `sum_l² / n_l + sum_r² / n_r`, which minimizes the summed
    /// squared error of the two children. Ties keep the earliest feature
    /// and position.
    #[allow(clippy::cast_precision_loss)]
    fn best_split(&self, x: &FeatureMatrix, y: &[f64], samples: &mut [usize]) -> Option<Candidate> {
        let n = samples.len();
        let total: f64 = samples.iter().map(|&s| y[s]).sum();
        let parent_score = total * total / n as f64;
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut best: Option<Candidate> = None;
        for feature in 0..x.n_features() {
            sort_by_feature(x, samples, feature);

            let mut left_sum = 0.0;
            for position in 1..n {
                left_sum += y[samples[position - 1]];
                if position < min_leaf || n - position < min_leaf {
                    continue;
                }

                let lo = x.get(samples[position - 1], feature);
                let hi = x.get(samples[position], feature);
                if lo >= hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / position as f64
                    + right_sum * right_sum / (n - position) as f64;

                let improves_parent = score > parent_score + f64::EPSILON * parent_score.abs();
                let beats_best = best.as_ref().map_or(true, |b| score > b.score);
                if improves_parent && beats_best {
                    let mid = lo + (hi - lo) / 2.0;
                    best = Some(Candidate {
                        feature,
                        position,
                        threshold: if mid < hi { mid } else { lo },
                        score,
                    });
                }
            }
        }
        best
    }
}

fn sort_by_feature(x: &FeatureMatrix, samples: &mut [usize], feature: usize) {
    samples.sort_by(|&a, &b| x.get(a, feature).total_cmp(&x.get(b, feature)));
}

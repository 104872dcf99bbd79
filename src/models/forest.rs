//! Bagged regression trees (random forest regressor).
//!
//! Each tree is a CART regressor grown on a bootstrap resample with
//! variance-reduction splits. Trees draw from independent seeded generators,
//! so a forest is fully reproducible from its parameters and training data.

use crate::error::{InsightsError, Result};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Forest hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees.
    pub n_trees: usize,
    /// Maximum tree depth (root has depth 0).
    pub max_depth: usize,
    /// Minimum samples in each leaf.
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` uses all of them.
    pub max_features: Option<usize>,
    /// Base seed; tree `i` uses `seed + i`.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 12,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

impl ForestParams {
    /// Set number of trees.
    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees.max(1);
        self
    }

    /// Set maximum depth.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set minimum leaf size.
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf.max(1);
        self
    }

    /// Set random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

/// A single regression tree stored as a flat node arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct Grower<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    params: &'a ForestParams,
    n_features: usize,
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed).
    fn grow(
        x: &[Vec<f64>],
        y: &[f64],
        samples: Vec<usize>,
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut grower = Grower {
            x,
            y,
            params,
            n_features: x.first().map_or(0, Vec::len),
            nodes: Vec::new(),
        };
        grower.build(samples, 0, rng);
        Self {
            nodes: grower.nodes,
        }
    }

    /// Predict a single feature row.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

impl Grower<'_> {
    fn build(&mut self, samples: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let id = self.nodes.len();
        let mean = samples.iter().map(|&i| self.y[i]).sum::<f64>() / samples.len() as f64;
        self.nodes.push(Node::Leaf { value: mean });

        let min_leaf = self.params.min_samples_leaf.max(1);
        if depth >= self.params.max_depth || samples.len() < 2 * min_leaf {
            return id;
        }

        let Some((feature, threshold)) = self.best_split(&samples, min_leaf, rng) else {
            return id;
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[i][feature] <= threshold);

        let left = self.build(left_samples, depth + 1, rng);
        let right = self.build(right_samples, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Split minimizing the summed squared error of both children.
    fn best_split(
        &self,
        samples: &[usize],
        min_leaf: usize,
        rng: &mut StdRng,
    ) -> Option<(usize, f64)> {
        let n = samples.len();
        let total: f64 = samples.iter().map(|&i| self.y[i]).sum();
        let total_sq: f64 = samples.iter().map(|&i| self.y[i] * self.y[i]).sum();
        let parent_sse = total_sq - total * total / n as f64;
        if parent_sse <= 1e-12 {
            return None;
        }

        let features: Vec<usize> = match self.params.max_features {
            Some(m) if m < self.n_features => sample(rng, self.n_features, m.max(1)).into_vec(),
            _ => (0..self.n_features).collect(),
        };

        let mut best: Option<(usize, f64, f64)> = None;
        let mut order = samples.to_vec();
        for &f in &features {
            order.sort_by(|&a, &b| {
                self.x[a][f]
                    .partial_cmp(&self.x[b][f])
                    .unwrap_or(Ordering::Equal)
            });

            let mut sum_left = 0.0;
            let mut sq_left = 0.0;
            for k in 1..n {
                let yi = self.y[order[k - 1]];
                sum_left += yi;
                sq_left += yi * yi;

                if k < min_leaf || n - k < min_leaf {
                    continue;
                }
                let lo = self.x[order[k - 1]][f];
                let hi = self.x[order[k]][f];
                if lo >= hi {
                    continue;
                }

                let sum_right = total - sum_left;
                let sq_right = total_sq - sq_left;
                let sse = (sq_left - sum_left * sum_left / k as f64)
                    + (sq_right - sum_right * sum_right / (n - k) as f64);
                if best.map_or(true, |(_, _, b)| sse < b) {
                    best = Some((f, 0.5 * (lo + hi), sse));
                }
            }
        }

        best.filter(|&(_, _, sse)| sse < parent_sse)
            .map(|(f, t, _)| (f, t))
    }
}

/// An ensemble of bootstrap-trained regression trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fit on row-major features `x` and target `y`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &ForestParams) -> Result<Self> {
        if x.is_empty() {
            return Err(InsightsError::EmptyDataset(
                "no rows to train the forest on".into(),
            ));
        }
        if x.len() != y.len() {
            return Err(InsightsError::DimensionMismatch {
                expected: x.len(),
                got: y.len(),
            });
        }
        let n_features = x[0].len();
        if let Some(row) = x.iter().find(|r| r.len() != n_features) {
            return Err(InsightsError::DimensionMismatch {
                expected: n_features,
                got: row.len(),
            });
        }
        if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
            return Err(InsightsError::InputValidation(
                "forest training data contains non-finite values".into(),
            ));
        }

        let n = x.len();
        let trees = (0..params.n_trees.max(1))
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let samples: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::grow(x, y, samples, params, &mut rng)
            })
            .collect();

        Ok(Self {
            params: params.clone(),
            n_features,
            trees,
        })
    }

    /// Mean prediction of all trees for one row.
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(InsightsError::DimensionMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|r| self.predict_row(r)).collect()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

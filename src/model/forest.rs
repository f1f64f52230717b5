//! Seeded random-forest regressor
//!
//! Bagging ensemble of [`RegressionTree`]s. Every tree sees a bootstrap
//! sample (n draws with replacement) and all features. Per-tree seeds are
//! drawn in order from one master generator, so the fitted forest is the
//! same whether trees train sequentially or on the rayon pool.

use super::tree::{RegressionTree, TreeParams};
use super::Regressor;
use crate::prepare::FeatureMatrix;
use crate::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Random-forest regressor
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    n_estimators: usize,
    seed: u64,
    params: TreeParams,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    /// Create an unfitted forest
    #[must_use]
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        Self {
            n_estimators,
            seed,
            params: TreeParams::default(),
            trees: Vec::new(),
        }
    }

    /// Set per-tree growth limits
    #[must_use]
    pub fn with_params(mut self, params: TreeParams) -> Self {
        self.params = params;
        self
    }

    /// Configured ensemble size
    #[must_use]
    pub const fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Fitted trees (empty before `fit`)
    #[must_use]
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    fn grow_tree(&self, x: &FeatureMatrix, y: &[f64], seed: u64) -> RegressionTree {
        let n = x.n_rows();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let samples = (0..n).map(|_| rng.gen_range(0..n)).collect();
        RegressionTree::fit(x, y, samples, self.params)
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(Error::Training(
                "Random forest needs at least one estimator".to_string(),
            ));
        }
        if x.n_rows() == 0 {
            return Err(Error::Training("Cannot fit on zero rows".to_string()));
        }
        if x.n_rows() != y.len() {
            return Err(Error::Training(format!(
                "Feature rows ({}) and target length ({}) differ",
                x.n_rows(),
                y.len()
            )));
        }

        let mut master = ChaCha8Rng::seed_from_u64(self.seed);
        let seeds: Vec<u64> = (0..self.n_estimators).map(|_| master.gen()).collect();

        #[cfg(feature = "parallel")]
        let trees = seeds.par_iter().map(|&s| self.grow_tree(x, y, s)).collect();
        #[cfg(not(feature = "parallel"))]
        let trees = seeds.iter().map(|&s| self.grow_tree(x, y, s)).collect();

        self.trees = trees;
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(Error::Training("Random forest is not fitted".to_string()));
        }
        let n_trees = self.trees.len() as f64;
        Ok((0..x.n_rows())
            .map(|row| {
                let row = x.row(row);
                self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees
            })
            .collect())
    }
}

//! Regression models and holdout scoring
//!
//! The engine needs exactly one model family (a seeded random forest) and
//! one metric (holdout R²). [`fit_and_score`] is the shared 80/20 protocol
//! used by both the benchmark model and every subgroup model.

mod forest;
mod metrics;
mod split;
mod tree;

pub use forest::RandomForestRegressor;
pub use metrics::r2_score;
pub use split::{train_test_split, HoldoutSplit, MIN_SPLIT_ROWS};
pub use tree::{RegressionTree, TreeParams};

use crate::prepare::{FeatureMatrix, PreparedData};
use crate::Result;

/// A model that maps feature rows to a numeric prediction
pub trait Regressor {
    /// Train on `x` / `y`
    ///
    /// # Errors
    /// Returns `Error::Training` if the inputs are empty or inconsistent
    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()>;

    /// Predict every row of `x`
    ///
    /// # Errors
    /// Returns `Error::Training` if the model has not been fitted
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>>;
}

/// Split, train, and score settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSpec {
    /// Number of trees
    pub n_estimators: usize,
    /// Seed for both the split and the forest
    pub seed: u64,
    /// Holdout fraction
    pub test_fraction: f64,
    /// Per-tree growth limits
    pub tree: TreeParams,
}

/// A fitted model and its holdout score
///
/// The model is owned by the caller that trained it and dropped with it.
#[derive(Debug, Clone)]
pub struct ModelFit {
    /// Fitted forest
    pub model: RandomForestRegressor,
    /// Holdout R² at full precision
    pub holdout_r2: f64,
    /// Rows used for training
    pub train_rows: usize,
    /// Rows used for scoring
    pub test_rows: usize,
}

/// Split prepared data, train a forest on the training rows and score it
/// on the holdout rows
///
/// # Errors
/// Returns `Error::Training` on a degenerate split or a failed fit
pub fn fit_and_score(data: &PreparedData, spec: &FitSpec) -> Result<ModelFit> {
    let split = train_test_split(data.features.n_rows(), spec.test_fraction, spec.seed)?;

    let x_train = data.features.select_rows(&split.train);
    let y_train: Vec<f64> = split.train.iter().map(|&i| data.target[i]).collect();
    let x_test = data.features.select_rows(&split.test);
    let y_test: Vec<f64> = split.test.iter().map(|&i| data.target[i]).collect();

    let mut model = RandomForestRegressor::new(spec.n_estimators, spec.seed).with_params(spec.tree);
    model.fit(&x_train, &y_train)?;
    let predictions = model.predict(&x_test)?;
    let holdout_r2 = r2_score(&y_test, &predictions);

    Ok(ModelFit {
        model,
        holdout_r2,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
    })
}

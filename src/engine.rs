//! Analysis engine: configuration and orchestration
//!
//! ```text
//! Dataset ──> prepare ──> benchmark forest ──────────────┐
//!    │                                                   ├──> axioms ──> AnalysisResult
//!    └──────> partitions ──> subgroup forests ──> mean ──┘
//! ```
//!
//! The engine holds no state besides its configuration. Every run borrows
//! the dataset read-only; models are dropped when the run returns.

use crate::aggregate::mean_score;
use crate::axiom::{validate, AxiomThresholds};
use crate::benchmark::fit_benchmark;
use crate::dataset::Dataset;
use crate::model::{FitSpec, TreeParams};
use crate::prepare::prepare;
use crate::result::{assemble, AnalysisResult};
use crate::subgroup::{self, SubgroupPolicy};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine settings (defaults reproduce the reference analysis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for every split and forest
    pub seed: u64,
    /// Holdout fraction of each split
    pub test_fraction: f64,
    /// Trees in the benchmark forest
    pub benchmark_estimators: usize,
    /// Trees in each subgroup forest
    pub subgroup_estimators: usize,
    /// Partitions with at most this many rows are skipped
    pub min_partition_rows: usize,
    /// Partitions with at most this many rows are prepared but not trained
    pub min_training_rows: usize,
    /// Optional depth cap for every tree
    pub max_depth: Option<usize>,
    /// Axiom thresholds
    pub axioms: AxiomThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            benchmark_estimators: 100,
            subgroup_estimators: 50,
            min_partition_rows: 10,
            min_training_rows: 20,
            max_depth: None,
            axioms: AxiomThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; absent fields take their defaults
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or the values are invalid
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `Error::Configuration` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(Error::Configuration(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.benchmark_estimators == 0 || self.subgroup_estimators == 0 {
            return Err(Error::Configuration(
                "estimator counts must be greater than 0".to_string(),
            ));
        }
        if self.min_training_rows < self.min_partition_rows {
            return Err(Error::Configuration(format!(
                "min_training_rows ({}) must be >= min_partition_rows ({})",
                self.min_training_rows, self.min_partition_rows
            )));
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            ..TreeParams::default()
        }
    }

    /// Fit settings of the benchmark forest
    #[must_use]
    pub fn benchmark_spec(&self) -> FitSpec {
        FitSpec {
            n_estimators: self.benchmark_estimators,
            seed: self.seed,
            test_fraction: self.test_fraction,
            tree: self.tree_params(),
        }
    }

    /// Partition thresholds and fit settings of the subgroup forests
    #[must_use]
    pub fn subgroup_policy(&self) -> SubgroupPolicy {
        SubgroupPolicy {
            min_partition_rows: self.min_partition_rows,
            min_training_rows: self.min_training_rows,
            fit: FitSpec {
                n_estimators: self.subgroup_estimators,
                ..self.benchmark_spec()
            },
        }
    }
}

/// Virtual Twins analysis engine
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine builder
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Engine with an explicit configuration
    ///
    /// # Errors
    /// Returns `Error::Configuration` if the configuration is invalid
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one analysis
    ///
    /// # Errors
    /// - `Error::EmptyDataset` if the dataset has no rows
    /// - `Error::Configuration` if either column is missing
    /// - `Error::Training` if preparation or the benchmark fit fails
    pub fn analyze(
        &self,
        dataset: &Dataset,
        outcome_column: &str,
        intervention_column: &str,
    ) -> Result<AnalysisResult> {
        let span = tracing::info_span!(
            "analysis",
            outcome = %outcome_column,
            intervention = %intervention_column,
            rows = dataset.num_rows()
        );
        let _guard = span.enter();

        if dataset.num_rows() == 0 {
            return Err(Error::EmptyDataset);
        }
        dataset.require_column("Outcome", outcome_column)?;
        dataset.require_column("Intervention", intervention_column)?;

        let prepared = prepare(dataset, outcome_column)?;
        let feature_count = prepared.features.n_features();
        let benchmark = fit_benchmark(&prepared, &self.config.benchmark_spec())?;

        let estimate = subgroup::estimate(
            dataset,
            intervention_column,
            outcome_column,
            &self.config.subgroup_policy(),
        )?;
        let aggregate = mean_score(&estimate.scores());
        let axioms = validate(
            benchmark.holdout_r2,
            aggregate,
            estimate.partition_count(),
            &self.config.axioms,
        );

        tracing::info!(
            benchmark_r2 = benchmark.holdout_r2,
            vt_method_r2 = aggregate,
            partitions = estimate.partition_count(),
            trained = estimate.scores().len(),
            axioms_passed = axioms.all_passed(),
            "analysis complete"
        );

        Ok(assemble(
            benchmark.holdout_r2,
            aggregate,
            axioms,
            estimate,
            dataset.num_rows(),
            feature_count,
        ))
    }
}

/// Engine builder
#[derive(Debug, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Seed for splits and forests
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Holdout fraction
    #[must_use]
    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.config.test_fraction = fraction;
        self
    }

    /// Trees in the benchmark forest
    #[must_use]
    pub fn benchmark_estimators(mut self, n: usize) -> Self {
        self.config.benchmark_estimators = n;
        self
    }

    /// Trees in each subgroup forest
    #[must_use]
    pub fn subgroup_estimators(mut self, n: usize) -> Self {
        self.config.subgroup_estimators = n;
        self
    }

    /// Skip partitions with at most `rows` rows
    #[must_use]
    pub fn min_partition_rows(mut self, rows: usize) -> Self {
        self.config.min_partition_rows = rows;
        self
    }

    /// Train only partitions with more than `rows` rows
    #[must_use]
    pub fn min_training_rows(mut self, rows: usize) -> Self {
        self.config.min_training_rows = rows;
        self
    }

    /// Cap tree depth
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    /// Axiom thresholds
    #[must_use]
    pub fn axiom_thresholds(mut self, thresholds: AxiomThresholds) -> Self {
        self.config.axioms = thresholds;
        self
    }

    /// Build the engine
    ///
    /// # Errors
    /// Returns `Error::Configuration` if a value is out of range
    pub fn build(self) -> Result<Engine> {
        Engine::with_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    #[test]
    fn test_default_config_matches_reference() {
        let config = EngineConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.benchmark_estimators, 100);
        assert_eq!(config.subgroup_estimators, 50);
        assert_eq!(config.min_partition_rows, 10);
        assert_eq!(config.min_training_rows, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_subgroup_policy_shares_seed_and_fraction() {
        let config = EngineConfig::default();
        let policy = config.subgroup_policy();
        assert_eq!(policy.fit.n_estimators, 50);
        assert_eq!(policy.fit.seed, config.seed);
        assert!((policy.fit.test_fraction - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{"seed": 7, "axioms": {"max_partitions": 3}}"#)
            .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.benchmark_estimators, 100);
        assert_eq!(config.axioms.max_partitions, 3);
        assert!((config.axioms.stability_max_gap - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Engine::builder().test_fraction(1.0).build().is_err());
        assert!(Engine::builder().test_fraction(0.0).build().is_err());
        assert!(Engine::builder().benchmark_estimators(0).build().is_err());
        assert!(Engine::builder()
            .min_partition_rows(30)
            .min_training_rows(20)
            .build()
            .is_err());
        assert!(matches!(
            EngineConfig::from_json(r#"{"test_fraction": 2.0}"#),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(EngineConfig::from_json("{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_analyze_empty_dataset() {
        let ds = Dataset::from_columns(vec![
            Column::numeric("y", vec![]),
            Column::categorical("arm", Vec::<&str>::new()),
        ])
        .unwrap();
        let err = Engine::default().analyze(&ds, "y", "arm").unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn test_analyze_missing_columns() {
        let ds = Dataset::from_columns(vec![
            Column::numeric("y", vec![1.0]),
            Column::categorical("arm", vec!["a"]),
        ])
        .unwrap();
        let engine = Engine::default();
        assert!(matches!(
            engine.analyze(&ds, "outcome", "arm"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            engine.analyze(&ds, "y", "group"),
            Err(Error::Configuration(_))
        ));
    }
}

//! Analysis result record
//!
//! The JSON form uses the report keys the upload/analyze front end reads:
//!
//! ```text
//! {
//!   "benchmark_r2": 0.8123,
//!   "vt_method_r2": 0.7654,
//!   "axioms": { "Axiom 1: Consistency": true, ... },
//!   "treatment_groups": 2,
//!   "sample_size": 500,
//!   "feature_count": 6,
//!   "subgroups": [ { "level": "treated", "rows": 250, "status": "trained", "r2": 0.77 }, ... ]
//! }
//! ```

use crate::axiom::AxiomRecord;
use crate::subgroup::{SubgroupEstimate, SubgroupOutcome, SubgroupReport};
use serde::{Deserialize, Serialize};

/// Decimal places kept in reported scores
pub const SCORE_DECIMALS: i32 = 4;

/// Round a score to [`SCORE_DECIMALS`] places (half away from zero)
#[must_use]
pub fn round_score(value: f64) -> f64 {
    let scale = 10f64.powi(SCORE_DECIMALS);
    (value * scale).round() / scale
}

/// Terminal output of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "benchmark_r2")]
    benchmark_score: f64,
    #[serde(rename = "vt_method_r2")]
    aggregate_score: f64,
    axioms: AxiomRecord,
    #[serde(rename = "treatment_groups")]
    partition_count: usize,
    #[serde(rename = "sample_size")]
    sample_count: usize,
    feature_count: usize,
    #[serde(default)]
    subgroups: Vec<SubgroupReport>,
}

impl AnalysisResult {
    /// Benchmark holdout R² (rounded)
    #[must_use]
    pub const fn benchmark_score(&self) -> f64 {
        self.benchmark_score
    }

    /// Mean subgroup holdout R² (rounded; `0.0` if nothing was trained)
    #[must_use]
    pub const fn aggregate_score(&self) -> f64 {
        self.aggregate_score
    }

    /// Axiom outcomes
    #[must_use]
    pub const fn axioms(&self) -> &AxiomRecord {
        &self.axioms
    }

    /// Distinct intervention values
    #[must_use]
    pub const fn partition_count(&self) -> usize {
        self.partition_count
    }

    /// Rows in the dataset
    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Columns in the benchmark feature matrix
    #[must_use]
    pub const fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Per-partition diagnostics (scores rounded)
    #[must_use]
    pub fn subgroups(&self) -> &[SubgroupReport] {
        &self.subgroups
    }

    /// Partitions that produced a score
    #[must_use]
    pub fn trained_partitions(&self) -> usize {
        self.subgroups.iter().filter(|s| s.score().is_some()).count()
    }
}

/// Package the run's outputs into one record, rounding scores
///
/// Axioms must already be evaluated on the unrounded scores.
#[must_use]
pub fn assemble(
    benchmark_score: f64,
    aggregate_score: f64,
    axioms: AxiomRecord,
    estimate: SubgroupEstimate,
    sample_count: usize,
    feature_count: usize,
) -> AnalysisResult {
    let partition_count = estimate.partition_count();
    let subgroups = estimate
        .into_reports()
        .into_iter()
        .map(|mut report| {
            if let SubgroupOutcome::Trained { r2 } = &mut report.outcome {
                *r2 = round_score(*r2);
            }
            report
        })
        .collect();

    AnalysisResult {
        benchmark_score: round_score(benchmark_score),
        aggregate_score: round_score(aggregate_score),
        axioms,
        partition_count,
        sample_count,
        feature_count,
        subgroups,
    }
}

//! Axiom validation: fixed sanity checks over the run's scores
//!
//! All three rules are always evaluated on full-precision scores. None of
//! them can fail; a NaN score simply makes the comparison false.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A named sanity-check rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Axiom {
    /// Aggregate subgroup score clears the minimum
    #[serde(rename = "Axiom 1: Consistency")]
    Consistency,
    /// Benchmark and aggregate scores stay close
    #[serde(rename = "Axiom 2: Stability")]
    Stability,
    /// Few enough treatment groups to interpret
    #[serde(rename = "Axiom 3: Interpretability")]
    Interpretability,
}

impl Axiom {
    /// Every axiom, in evaluation order
    pub const ALL: [Self; 3] = [Self::Consistency, Self::Stability, Self::Interpretability];

    /// Display name used in reports
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Consistency => "Axiom 1: Consistency",
            Self::Stability => "Axiom 2: Stability",
            Self::Interpretability => "Axiom 3: Interpretability",
        }
    }
}

impl fmt::Display for Axiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rule thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxiomThresholds {
    /// Consistency holds when `aggregate_score > consistency_min_score`
    pub consistency_min_score: f64,
    /// Stability holds when `|benchmark - aggregate| < stability_max_gap`
    pub stability_max_gap: f64,
    /// Interpretability holds when `partition_count <= max_partitions`
    pub max_partitions: usize,
}

impl Default for AxiomThresholds {
    fn default() -> Self {
        Self {
            consistency_min_score: 0.3,
            stability_max_gap: 0.5,
            max_partitions: 10,
        }
    }
}

/// Outcome of every axiom for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AxiomRecord(BTreeMap<Axiom, bool>);

impl AxiomRecord {
    /// Whether `axiom` held (`false` if it was not recorded)
    #[must_use]
    pub fn passed(&self, axiom: Axiom) -> bool {
        self.0.get(&axiom).copied().unwrap_or(false)
    }

    /// Whether every recorded axiom held
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.0.values().all(|&v| v)
    }

    /// `(axiom, passed)` pairs in axiom order
    pub fn iter(&self) -> impl Iterator<Item = (Axiom, bool)> + '_ {
        self.0.iter().map(|(&a, &v)| (a, v))
    }

    /// Number of recorded axioms
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Evaluate all three axioms
#[must_use]
pub fn validate(
    benchmark_score: f64,
    aggregate_score: f64,
    partition_count: usize,
    thresholds: &AxiomThresholds,
) -> AxiomRecord {
    let record = Axiom::ALL
        .into_iter()
        .map(|axiom| {
            let passed = match axiom {
                Axiom::Consistency => aggregate_score > thresholds.consistency_min_score,
                Axiom::Stability => {
                    (benchmark_score - aggregate_score).abs() < thresholds.stability_max_gap
                }
                Axiom::Interpretability => partition_count <= thresholds.max_partitions,
            };
            (axiom, passed)
        })
        .collect();
    AxiomRecord(record)
}

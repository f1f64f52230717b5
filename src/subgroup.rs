//! Virtual Twins subgroup estimator
//!
//! Partitions the dataset by intervention level (first-seen order) and fits
//! an independent forest per partition:
//!
//! | Partition rows | Treatment |
//! |---|---|
//! | `<= min_partition_rows` (10) | skipped entirely |
//! | up to `min_training_rows` (20) | prepared, never trained |
//! | `> min_training_rows` | prepared, split 80/20, trained, scored |
//!
//! A partition that fails is logged and reported as [`SubgroupOutcome::Failed`];
//! the other partitions are unaffected.

use crate::dataset::Dataset;
use crate::model::{fit_and_score, FitSpec};
use crate::prepare::prepare;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Size thresholds and fit settings for subgroup models
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubgroupPolicy {
    /// Partitions with at most this many rows are skipped
    pub min_partition_rows: usize,
    /// Partitions with at most this many rows are never trained
    pub min_training_rows: usize,
    /// Split/forest settings for each trained partition
    pub fit: FitSpec,
}

/// What happened to one partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubgroupOutcome {
    /// Trained and scored on its holdout rows
    Trained {
        /// Holdout R²
        r2: f64,
    },
    /// Enough rows to prepare, too few to train
    PreparedOnly,
    /// Too few rows to consider
    Skipped,
    /// Preparation or training failed; excluded from the aggregate
    Failed {
        /// Error message
        reason: String,
    },
}

/// Per-partition diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupReport {
    /// Intervention value identifying the partition
    pub level: String,
    /// Rows in the partition
    pub rows: usize,
    /// Outcome of the partition
    #[serde(flatten)]
    pub outcome: SubgroupOutcome,
}

impl SubgroupReport {
    /// Holdout R² if the partition was trained
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        match &self.outcome {
            SubgroupOutcome::Trained { r2 } => Some(*r2),
            _ => None,
        }
    }
}

/// All partition reports of one run, in first-seen order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubgroupEstimate {
    reports: Vec<SubgroupReport>,
}

impl SubgroupEstimate {
    /// Partition reports
    #[must_use]
    pub fn reports(&self) -> &[SubgroupReport] {
        &self.reports
    }

    /// Consume into the partition reports
    #[must_use]
    pub fn into_reports(self) -> Vec<SubgroupReport> {
        self.reports
    }

    /// Number of distinct intervention values (trainable or not)
    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.reports.len()
    }

    /// Holdout R² of every trained partition, in partition order
    #[must_use]
    pub fn scores(&self) -> Vec<f64> {
        self.reports.iter().filter_map(SubgroupReport::score).collect()
    }
}

/// Fit one model per intervention level
///
/// # Errors
/// Returns `Error::Configuration` if the intervention column is absent.
/// Per-partition failures never surface here.
pub fn estimate(
    dataset: &Dataset,
    intervention_column: &str,
    outcome_column: &str,
    policy: &SubgroupPolicy,
) -> Result<SubgroupEstimate> {
    let intervention = dataset.require_column("Intervention", intervention_column)?;
    let groups = dataset.group_rows(intervention)?;

    let reports = groups
        .into_iter()
        .map(|(level, rows)| {
            let level = level.to_string();
            let outcome = fit_partition(dataset, &rows, outcome_column, policy);
            match &outcome {
                SubgroupOutcome::Failed { reason } => {
                    tracing::warn!(level = %level, rows = rows.len(), %reason, "partition excluded");
                }
                other => {
                    tracing::debug!(level = %level, rows = rows.len(), outcome = ?other, "partition done");
                }
            }
            SubgroupReport {
                level,
                rows: rows.len(),
                outcome,
            }
        })
        .collect();

    Ok(SubgroupEstimate { reports })
}

fn fit_partition(
    dataset: &Dataset,
    rows: &[u32],
    outcome_column: &str,
    policy: &SubgroupPolicy,
) -> SubgroupOutcome {
    if rows.len() <= policy.min_partition_rows {
        return SubgroupOutcome::Skipped;
    }

    let attempt = || -> Result<Option<f64>> {
        let partition = dataset.take_rows(rows)?;
        let prepared = prepare(&partition, outcome_column)?;
        if rows.len() <= policy.min_training_rows {
            return Ok(None);
        }
        Ok(Some(fit_and_score(&prepared, &policy.fit)?.holdout_r2))
    };

    match attempt() {
        Ok(Some(r2)) => SubgroupOutcome::Trained { r2 },
        Ok(None) => SubgroupOutcome::PreparedOnly,
        Err(e) => SubgroupOutcome::Failed {
            reason: e.to_string(),
        },
    }
}

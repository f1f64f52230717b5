//! # Virtual Twins: subgroup analysis vs. a pooled benchmark
//!
//! **Version**: 0.1.0
//!
//! Evaluates the Virtual Twins workflow on one tabular dataset: a random
//! forest is trained per intervention group and their mean holdout R² is
//! compared with one pooled benchmark forest. Three fixed sanity checks
//! ("axioms") are evaluated over the scores.
//!
//! ## Pipeline
//!
//! - **Dataset Preparation** ([`prepare`]): drop the outcome, encode categoricals
//! - **Benchmark Model** ([`benchmark`]): 100-tree forest, seeded 80/20 split
//! - **Subgroup Estimator** ([`subgroup`]): 50-tree forest per partition with > 20 rows
//! - **Aggregator** ([`aggregate`]): mean of subgroup scores, `0.0` if none
//! - **Axiom Validator** ([`axiom`]): consistency, stability, interpretability
//! - **Result Assembler** ([`result`]): rounded, serialisable record
//!
//! ## Example Usage
//!
//! ```rust
//! use virtual_twins::dataset::{Column, Dataset};
//!
//! let arm: Vec<&str> = (0..30).map(|i| if i % 2 == 0 { "treated" } else { "control" }).collect();
//! let dose: Vec<f64> = (0..30_i32).map(f64::from).collect();
//! let response: Vec<f64> = dose.iter().map(|d| d * 0.5).collect();
//!
//! let dataset = Dataset::from_columns(vec![
//!     Column::numeric("dose", dose),
//!     Column::categorical("arm", arm),
//!     Column::numeric("response", response),
//! ])?;
//!
//! let result = virtual_twins::analyze(&dataset, "response", "arm")?;
//! assert_eq!(result.partition_count(), 2);
//! assert_eq!(result.sample_count(), 30);
//! // 15 rows per arm: no subgroup is large enough to train
//! assert_eq!(result.aggregate_score(), 0.0);
//! # Ok::<(), virtual_twins::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod axiom;
pub mod benchmark;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod prepare;
pub mod result;
pub mod session;
pub mod subgroup;

pub use axiom::{Axiom, AxiomRecord, AxiomThresholds};
pub use dataset::Dataset;
pub use engine::{Engine, EngineBuilder, EngineConfig};
pub use error::{Error, Result};
pub use result::AnalysisResult;
pub use session::{AnalysisConfiguration, AnalysisSession};

/// Run one analysis with the default engine configuration
///
/// # Errors
/// See [`Engine::analyze`]
pub fn analyze(
    dataset: &Dataset,
    outcome_column: &str,
    intervention_column: &str,
) -> Result<AnalysisResult> {
    Engine::default().analyze(dataset, outcome_column, intervention_column)
}

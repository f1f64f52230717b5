//! Benchmark model: one pooled forest over the full dataset

use crate::model::{fit_and_score, FitSpec, ModelFit};
use crate::prepare::PreparedData;
use crate::{Error, Result};

/// Fit the pooled benchmark forest and score it on the holdout rows
///
/// # Errors
/// Returns `Error::Training` if the split is degenerate or the fit fails.
/// A benchmark failure aborts the analysis.
pub fn fit_benchmark(data: &PreparedData, spec: &FitSpec) -> Result<ModelFit> {
    let fit = fit_and_score(data, spec).map_err(|e| match e {
        Error::Training(msg) => Error::Training(format!("Benchmark model: {msg}")),
        other => other,
    })?;

    tracing::debug!(
        estimators = spec.n_estimators,
        train_rows = fit.train_rows,
        test_rows = fit.test_rows,
        r2 = fit.holdout_r2,
        "benchmark model scored"
    );
    Ok(fit)
}

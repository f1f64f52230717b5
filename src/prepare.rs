//! Dataset preparation: feature matrix + target vector
//!
//! Drops the outcome column, keeps every other column (the intervention
//! column included) and replaces categorical columns by integer codes.
//!
//! ## Categorical encoding
//!
//! Each distinct value gets its first-seen rank (0-based) within its own
//! column; null cells encode to `-1`. Codes are derived from the rows being
//! prepared and nothing else.
//!
//! **Known inconsistency**: the full dataset and every partition are prepared
//! separately, so the same category can map to different codes in the
//! benchmark model and in a subgroup model (or in two subgroup models).
//! This mirrors the reference behavior and is kept on purpose.

use crate::dataset::{ColumnKind, Dataset};
use crate::{Error, Result};
use std::collections::HashMap;

/// Code assigned to a null categorical cell
pub const MISSING_CODE: f64 = -1.0;

/// Row-major numeric feature matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Vec<f64>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Build from column-major data
    ///
    /// # Errors
    /// Returns `Error::Training` if the columns differ in length or the
    /// number of names differs from the number of columns
    pub fn from_columns(names: Vec<String>, columns: &[Vec<f64>]) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(Error::Training(format!(
                "{} feature names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        let n_rows = columns.first().map_or(0, Vec::len);
        if let Some(bad) = columns.iter().position(|c| c.len() != n_rows) {
            return Err(Error::Training(format!(
                "Feature column '{}' has {} rows, expected {n_rows}",
                names[bad],
                columns[bad].len()
            )));
        }

        let mut values = Vec::with_capacity(n_rows * columns.len());
        for row in 0..n_rows {
            values.extend(columns.iter().map(|c| c[row]));
        }

        Ok(Self {
            names,
            values,
            n_rows,
        })
    }

    /// Number of rows
    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of feature columns
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    /// Feature names in column order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// One row
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        let width = self.n_features();
        &self.values[row * width..(row + 1) * width]
    }

    /// Single cell
    #[must_use]
    pub fn get(&self, row: usize, feature: usize) -> f64 {
        self.values[row * self.n_features() + feature]
    }

    /// New matrix holding only the given rows, in the given order
    #[must_use]
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut values = Vec::with_capacity(rows.len() * self.n_features());
        for &row in rows {
            values.extend_from_slice(self.row(row));
        }
        Self {
            names: self.names.clone(),
            values,
            n_rows: rows.len(),
        }
    }
}

/// Output of [`prepare`]
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    /// Every column except the outcome, numerically encoded
    pub features: FeatureMatrix,
    /// Outcome column values
    pub target: Vec<f64>,
}

/// Split a dataset into an encoded feature matrix and the outcome vector
///
/// # Errors
/// - `Error::Configuration` if the outcome column is absent
/// - `Error::Training` if the outcome is non-numeric or has nulls, or a
///   numeric feature has nulls
pub fn prepare(dataset: &Dataset, outcome_column: &str) -> Result<PreparedData> {
    let outcome = dataset.require_column("Outcome", outcome_column)?;
    let target = outcome_values(dataset, outcome)?;

    let mut names = Vec::with_capacity(dataset.num_columns().saturating_sub(1));
    let mut columns = Vec::with_capacity(names.capacity());

    for index in (0..dataset.num_columns()).filter(|&i| i != outcome) {
        let name = dataset.column_name(index);
        let encoded = match dataset.column_kind(index) {
            ColumnKind::Numeric => dataset
                .numeric_values(index)?
                .into_iter()
                .map(|v| {
                    v.ok_or_else(|| {
                        Error::Training(format!("Feature column '{name}' has missing values"))
                    })
                })
                .collect::<Result<Vec<f64>>>()?,
            ColumnKind::Categorical => factorize(&dataset.text_values(index)?),
        };
        names.push(name);
        columns.push(encoded);
    }

    let features = FeatureMatrix::from_columns(names, &columns)?;
    tracing::trace!(
        rows = features.n_rows(),
        features = features.n_features(),
        "prepared feature matrix"
    );

    Ok(PreparedData { features, target })
}

fn outcome_values(dataset: &Dataset, index: usize) -> Result<Vec<f64>> {
    let name = dataset.column_name(index);
    if dataset.column_kind(index) != ColumnKind::Numeric {
        return Err(Error::Training(format!(
            "Outcome column '{name}' must be numeric for regression"
        )));
    }
    dataset
        .numeric_values(index)?
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| Error::Training(format!("Outcome column '{name}' has missing values")))
        })
        .collect()
}

/// First-seen integer codes for a categorical column
///
/// Nulls encode to [`MISSING_CODE`] and do not consume a code.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn factorize(values: &[Option<String>]) -> Vec<f64> {
    let mut codes: HashMap<&str, usize> = HashMap::new();
    values
        .iter()
        .map(|value| match value {
            Some(v) => {
                let next = codes.len();
                *codes.entry(v.as_str()).or_insert(next) as f64
            }
            None => MISSING_CODE,
        })
        .collect()
}

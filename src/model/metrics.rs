//! Regression scoring

/// Coefficient of determination (R²)
///
/// `1 - SS_res / SS_tot`. When the true values are constant (`SS_tot == 0`)
/// the score is `1.0` for a perfect prediction and `0.0` otherwise, so the
/// result is always finite.
///
/// Returns `0.0` for empty or mismatched inputs.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return 0.0;
    }

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }

    1.0 - ss_res / ss_tot
}

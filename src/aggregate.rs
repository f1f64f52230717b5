//! Method-level score aggregation

/// Arithmetic mean of the per-partition scores
///
/// An empty sequence yields exactly `0.0`, meaning "no partition produced a
/// score". Check the partition reports to tell that apart from a genuine
/// mean of zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

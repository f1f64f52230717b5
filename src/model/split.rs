//! Seeded train/holdout split

use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Minimum rows on each side of a split
pub const MIN_SPLIT_ROWS: usize = 2;

/// Row indices of a train/holdout split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldoutSplit {
    /// Training rows
    pub train: Vec<usize>,
    /// Holdout rows
    pub test: Vec<usize>,
}

/// Shuffle `0..n_rows` with a seeded generator and cut off the holdout
///
/// The holdout size is `ceil(n_rows * test_fraction)` and takes the first
/// indices of the permutation. The same `(n_rows, test_fraction, seed)`
/// always yields the same split.
///
/// # Errors
/// Returns `Error::Training` if either side would hold fewer than
/// [`MIN_SPLIT_ROWS`] rows
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn train_test_split(n_rows: usize, test_fraction: f64, seed: u64) -> Result<HoldoutSplit> {
    let n_test = (n_rows as f64 * test_fraction).ceil() as usize;
    let n_train = n_rows.saturating_sub(n_test);

    if n_train < MIN_SPLIT_ROWS || n_test < MIN_SPLIT_ROWS {
        return Err(Error::Training(format!(
            "Degenerate split of {n_rows} rows: {n_train} train / {n_test} holdout \
             (need at least {MIN_SPLIT_ROWS} on each side)"
        )));
    }

    let mut permutation: Vec<usize> = (0..n_rows).collect();
    permutation.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    let train = permutation.split_off(n_test);

    Ok(HoldoutSplit {
        train,
        test: permutation,
    })
}

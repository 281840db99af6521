//! Minority-class upsampling.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::dataset::class_counts;

/// Row order after upsampling: every original row, then minority duplicates.
///
/// Draws minority rows with replacement until `minority / majority >= ratio`.
/// Balanced or single-class inputs are returned unchanged.
pub(crate) fn upsample_indices(labels: &[usize], ratio: f64, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..labels.len()).collect();
    let counts = class_counts(labels);
    let (minority, majority) = if counts[0] < counts[1] { (0, 1) } else { (1, 0) };
    if counts[minority] == 0 {
        return order;
    }

    let majority_count = counts[majority] as f64;
    let mut target = (ratio * majority_count).floor() as usize;
    while (target as f64) / majority_count < ratio {
        target += 1;
    }
    let n_extra = target.saturating_sub(counts[minority]);
    if n_extra == 0 {
        return order;
    }

    let pool: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == minority).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.extend((0..n_extra).map(|_| pool[rng.gen_range(0..pool.len())]));
    order
}

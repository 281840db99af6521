//! Deterministic per-unit seed derivation.
//!
//! Every random stream in the pipeline (split, folds, resampling, forest
//! bootstrap) gets its own seed mixed from the master seed and the stream's
//! coordinates, so results never depend on scheduling order.

/// Stream tag for the train/test split.
pub(crate) const SPLIT: u64 = 1;
/// Stream tag for fold assignment within a repeat.
pub(crate) const FOLDS: u64 = 2;
/// Stream tag for minority-class resampling.
pub(crate) const RESAMPLE: u64 = 3;
/// Stream tag for forest training.
pub(crate) const TRAIN: u64 = 4;
/// Coordinate marking the full training partition rather than a fold.
pub(crate) const FULL_TRAIN: u64 = u64::MAX;

/// SplitMix64 finalizer.
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Mix a master seed with a stream tag and its coordinates.
pub(crate) fn derive(master: u64, stream: u64, coords: &[u64]) -> u64 {
    coords
        .iter()
        .fold(splitmix64(master ^ splitmix64(stream)), |acc, &c| {
            splitmix64(acc ^ splitmix64(c))
        })
}

//! Hyperparameter grid construction.

use std::fmt;

use serde::Serialize;

use crate::error::TuneError;

/// Spread of the features-per-split range on each side of `round(sqrt(F))`.
const FEATURES_PER_SPLIT_SPREAD: i64 = 5;
/// Inclusive minimum-leaf-size range.
const MIN_LEAF_RANGE: (i64, i64) = (2, 10);

/// One point of the grid: `(mtry, min_n)`.
///
/// Ordering is by features-per-split, then minimum leaf size, which is also
/// the "simplest model first" order used to break selection ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HyperparameterCombination {
    /// Features drawn as split candidates at each node.
    pub features_per_split: usize,
    /// Minimum records a node needs before it may be split.
    pub min_leaf_size: usize,
}

impl HyperparameterCombination {
    /// Create a combination.
    #[must_use]
    pub fn new(features_per_split: usize, min_leaf_size: usize) -> Self {
        Self {
            features_per_split,
            min_leaf_size,
        }
    }
}

impl fmt::Display for HyperparameterCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mtry={}, min_n={}",
            self.features_per_split, self.min_leaf_size
        )
    }
}

/// An ordered, de-duplicated set of combinations to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HyperparameterGrid {
    combinations: Vec<HyperparameterCombination>,
}

impl HyperparameterGrid {
    /// Build the regular grid for `n_features` retained features.
    ///
    /// Features-per-split takes `levels.0` evenly spaced integers over
    /// `[m - 5, m + 5]` with `m = round(sqrt(n_features))`, clipped to
    /// `[1, n_features]`. Minimum leaf size takes `levels.1` evenly spaced
    /// integers over `[2, 10]`. A single level takes the midpoint. Values
    /// that collapse together after rounding or clipping appear once, so the
    /// grid may hold fewer than `levels.0 * levels.1` points.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::NoFeatures`] | `n_features == 0` |
    /// | [`TuneError::InvalidGridLevels`] | Either level count is zero |
    pub fn regular(n_features: usize, levels: (usize, usize)) -> Result<Self, TuneError> {
        if n_features == 0 {
            return Err(TuneError::NoFeatures);
        }
        if levels.0 == 0 || levels.1 == 0 {
            return Err(TuneError::InvalidGridLevels {
                features_per_split: levels.0,
                min_leaf_size: levels.1,
            });
        }

        let m = (n_features as f64).sqrt().round() as i64;
        let mtry = spaced(
            m - FEATURES_PER_SPLIT_SPREAD,
            m + FEATURES_PER_SPLIT_SPREAD,
            levels.0,
            (1, n_features as i64),
        );
        let min_n = spaced(MIN_LEAF_RANGE.0, MIN_LEAF_RANGE.1, levels.1, MIN_LEAF_RANGE);

        let combinations = mtry
            .iter()
            .flat_map(|&f| min_n.iter().map(move |&n| HyperparameterCombination::new(f, n)))
            .collect();
        Ok(Self { combinations })
    }

    /// Build a grid from explicit combinations, sorted and de-duplicated.
    ///
    /// # Errors
    ///
    /// Returns [`TuneError::EmptyGrid`] if `combinations` is empty.
    pub fn from_combinations(
        mut combinations: Vec<HyperparameterCombination>,
    ) -> Result<Self, TuneError> {
        if combinations.is_empty() {
            return Err(TuneError::EmptyGrid);
        }
        combinations.sort_unstable();
        combinations.dedup();
        Ok(Self { combinations })
    }

    /// Return the combinations in evaluation order.
    #[must_use]
    pub fn combinations(&self) -> &[HyperparameterCombination] {
        &self.combinations
    }

    /// Return the number of combinations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    /// Return `true` if the grid has no combinations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }
}

/// `levels` evenly spaced integers over `[lo, hi]`, rounded, clipped, de-duplicated.
fn spaced(lo: i64, hi: i64, levels: usize, clip: (i64, i64)) -> Vec<usize> {
    let raw: Vec<f64> = if levels == 1 {
        vec![(lo + hi) as f64 / 2.0]
    } else {
        let step = (hi - lo) as f64 / (levels - 1) as f64;
        (0..levels).map(|i| lo as f64 + step * i as f64).collect()
    };
    let mut values: Vec<usize> = raw
        .into_iter()
        .map(|v| (v.round() as i64).clamp(clip.0, clip.1) as usize)
        .collect();
    values.dedup();
    values
}

//! Configuration builder for forest training.

use crate::error::ForestError;
use crate::forest::RandomForest;
use crate::split::SplitCriterion;

/// Strategy for determining the number of features to consider at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    /// Floor of the square root of total features (at least 1).
    Sqrt,
    /// A fixed count.
    Fixed(usize),
    /// All features (plain bagging).
    All,
}

/// Configuration for forest training.
///
/// Construct via [`ForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter       | Default  |
/// |-----------------|----------|
/// | `max_features`  | `Sqrt`   |
/// | `min_node_size` | 2        |
/// | `criterion`     | `Gini`   |
/// | `seed`          | 42       |
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) min_node_size: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) seed: u64,
}

impl ForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            min_node_size: 2,
            criterion: SplitCriterion::Gini,
            seed: 42,
        })
    }

    // --- Setters ---

    /// Set the max features strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the minimum number of samples a node needs before it may be split.
    #[must_use]
    pub fn with_min_node_size(mut self, min_node_size: usize) -> Self {
        self.min_node_size = min_node_size;
        self
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the max features strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the minimum node size required to split.
    #[must_use]
    pub fn min_node_size(&self) -> usize {
        self.min_node_size
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a forest on the provided dataset.
    ///
    /// `features[sample_idx][feature_idx]` is row-major.
    /// `labels[sample_idx]` is 0 for the negative class, 1 for the positive class.
    /// `feature_names` names each feature column.
    ///
    /// # Errors
    ///
    /// | Variant                                  | When                                              |
    /// |------------------------------------------|---------------------------------------------------|
    /// | [`ForestError::EmptyDataset`]            | `features` is empty                               |
    /// | [`ForestError::ZeroFeatures`]            | rows have zero feature columns                    |
    /// | [`ForestError::LabelCountMismatch`]      | `labels.len() != features.len()`                  |
    /// | [`ForestError::NonBinaryLabel`]          | a label is not 0 or 1                             |
    /// | [`ForestError::FeatureCountMismatch`]    | rows have inconsistent lengths                    |
    /// | [`ForestError::FeatureNameMismatch`]     | `feature_names` length differs from column count  |
    /// | [`ForestError::NonFiniteValue`]          | any value is NaN or infinite                      |
    /// | [`ForestError::InvalidMaxFeatures`]      | resolved max_features is outside [1, n_features]  |
    /// | [`ForestError::InvalidMinNodeSize`]      | `min_node_size` < 2                               |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<RandomForest, ForestError> {
        crate::forest::train(self, features, labels, feature_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ForestConfig::new(10).unwrap();
        assert_eq!(config.n_trees(), 10);
        assert_eq!(config.max_features(), MaxFeatures::Sqrt);
        assert_eq!(config.min_node_size(), 2);
        assert_eq!(config.criterion(), SplitCriterion::Gini);
        assert_eq!(config.seed(), 42);
    }

    #[test]
    fn zero_trees_rejected() {
        let err = ForestConfig::new(0).unwrap_err();
        assert!(matches!(err, ForestError::InvalidTreeCount { n_trees: 0 }));
    }
}

//! Prediction methods for the fitted forest.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::ForestError;
use crate::forest::RandomForest;

impl RandomForest {
    /// Positive-class probability for one sample, averaged over all trees.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<f64, ForestError> {
        if sample.len() != self.n_features {
            return Err(ForestError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.positive_fraction(sample))
            .sum();
        Ok(total / self.trees.len() as f64)
    }

    /// Predicted label for one sample: 1 when the positive probability is at least 0.5.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, ForestError> {
        Ok(usize::from(self.predict_proba(sample)? >= 0.5))
    }

    /// Positive-class probabilities for a batch of samples, in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_proba_batch(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ForestError> {
        features
            .into_par_iter()
            .map(|sample| self.predict_proba(sample))
            .collect()
    }

    /// Predicted labels for a batch of samples, in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, ForestError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the resolved number of features drawn per split.
    #[must_use]
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Return the minimum node size required to split.
    #[must_use]
    pub fn min_node_size(&self) -> usize {
        self.min_node_size
    }

    /// Return the feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[crate::DecisionTree] {
        &self.trees
    }
}

#[cfg(test)]
mod tests {
    use crate::{ForestConfig, ForestError};

    #[test]
    fn probabilities_are_in_unit_interval() {
        let features: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let labels: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
        let names = vec!["a".to_string(), "b".to_string()];
        let forest = ForestConfig::new(15).unwrap().fit(&features, &labels, &names).unwrap();

        let probs = forest.predict_proba_batch(&features).unwrap();
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        let labels_pred = forest.predict_batch(&features).unwrap();
        for (p, l) in probs.iter().zip(&labels_pred) {
            assert_eq!(*l, usize::from(*p >= 0.5));
        }
        assert_eq!(forest.n_trees(), 15);
        assert_eq!(forest.max_features(), 1);
    }

    #[test]
    fn wrong_width_rejected() {
        let features = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let names = vec!["a".to_string()];
        let forest = ForestConfig::new(3)
            .unwrap()
            .fit(&features, &[0, 0, 1, 1], &names)
            .unwrap();
        let err = forest.predict_proba(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::PredictionFeatureMismatch {
                expected: 1,
                got: 2
            }
        ));
    }
}

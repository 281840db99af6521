//! Feature importance aggregation across trees.

use crate::forest::RandomForest;

impl RandomForest {
    /// Mean Decrease in Impurity per feature, in training column order.
    ///
    /// Each tree's decreases are normalized to sum to 1.0 before summing, and
    /// the forest total is normalized again. A forest made only of single-leaf
    /// trees reports all zeros.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            let decreases = tree.impurity_decreases();
            let tree_sum: f64 = decreases.iter().sum();
            if tree_sum <= 0.0 {
                continue;
            }
            for (total, d) in totals.iter_mut().zip(&decreases) {
                *total += d / tree_sum;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use crate::{ForestConfig, MaxFeatures};

    #[test]
    fn importances_sum_to_one_and_favor_signal() {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let class = i % 2;
            // Feature 0 carries the label, feature 1 is a weak ramp.
            features.push(vec![class as f64 * 5.0 + (i % 3) as f64 * 0.1, (i % 7) as f64]);
            labels.push(class);
        }
        let names = vec!["signal".to_string(), "noise".to_string()];
        let forest = ForestConfig::new(25)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .fit(&features, &labels, &names)
            .unwrap();

        let imp = forest.feature_importances();
        let total: f64 = imp.iter().sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        assert!(imp[0] > imp[1], "importances = {imp:?}");
    }

    #[test]
    fn single_class_forest_has_zero_importances() {
        let features = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let names = vec!["a".to_string(), "b".to_string()];
        let forest = ForestConfig::new(4)
            .unwrap()
            .fit(&features, &[1, 1, 1], &names)
            .unwrap();
        assert_eq!(forest.feature_importances(), vec![0.0, 0.0]);
    }
}

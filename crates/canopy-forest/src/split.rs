use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    #[default]
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its `[negative, positive]` counts.
    ///
    /// An empty node has zero impurity.
    #[must_use]
    pub fn impurity(&self, counts: [usize; 2]) -> Impurity {
        let n = counts[0] + counts[1];
        if n == 0 {
            return Impurity::new(0.0);
        }
        let n = n as f64;
        let value = match self {
            SplitCriterion::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum::<f64>()
            }
            SplitCriterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        };
        Impurity::new(value)
    }
}

/// Best split found for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// Weighted impurity decrease (MDI formula).
    pub(crate) impurity_decrease: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Find the best split among `max_features` randomly drawn features.
///
/// `features` is column-major: `features[feature_idx][sample_idx]`, and
/// `sample_indices` index into the inner vectors. Each drawn feature is
/// sorted once and scanned left to right with incremental class counts.
///
/// Returns `None` when no drawn feature has two distinct values.
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    criterion: SplitCriterion,
    max_features: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_features = features.len();
    let n_samples = sample_indices.len();
    if n_samples < 2 || n_features == 0 {
        return None;
    }

    let mut parent_counts = [0usize; 2];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }
    let parent_impurity = criterion.impurity(parent_counts).value();

    // Partial Fisher-Yates over the feature order.
    let mut feature_order: Vec<usize> = (0..n_features).collect();
    let take = max_features.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        feature_order.swap(i, j);
    }

    let mut best_decrease = f64::NEG_INFINITY;
    let mut best: Option<(usize, f64)> = None;
    let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n_samples);

    for &feat_idx in &feature_order[..take] {
        let column = &features[feat_idx];
        sorted.clear();
        sorted.extend(sample_indices.iter().map(|&si| (column[si], labels[si])));
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let mut left = [0usize; 2];
        let mut right = parent_counts;
        for i in 0..(n_samples - 1) {
            let (value, class) = sorted[i];
            left[class] += 1;
            right[class] -= 1;

            let next = sorted[i + 1].0;
            if value == next {
                continue;
            }

            let n_left = i + 1;
            let n_right = n_samples - n_left;
            let decrease = n_samples as f64 * parent_impurity
                - n_left as f64 * criterion.impurity(left).value()
                - n_right as f64 * criterion.impurity(right).value();

            if decrease > best_decrease {
                best_decrease = decrease;
                best = Some((feat_idx, (value + next) / 2.0));
            }
        }
    }

    let (feature, threshold) = best?;
    let column = &features[feature];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .partition(|&&si| column[si] <= threshold);

    Some(SplitResult {
        feature: FeatureIndex::new(feature),
        threshold,
        impurity_decrease: best_decrease,
        left_indices,
        right_indices,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn gini_of_balanced_node() {
        let imp = SplitCriterion::Gini.impurity([5, 5]);
        assert!((imp.value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn entropy_of_pure_node_is_zero() {
        assert_eq!(SplitCriterion::Entropy.impurity([0, 7]).value(), 0.0);
        assert_eq!(SplitCriterion::Gini.impurity([0, 0]).value(), 0.0);
    }

    #[test]
    fn separable_feature_is_chosen() {
        // Feature 0 separates the classes at 2.5, feature 1 is constant.
        let features = vec![vec![1.0, 2.0, 3.0, 4.0], vec![0.0, 0.0, 0.0, 0.0]];
        let labels = vec![0, 0, 1, 1];
        let indices = vec![0, 1, 2, 3];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let split =
            find_best_split(&features, &labels, &indices, SplitCriterion::Gini, 2, &mut rng)
                .unwrap();
        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 2.5).abs() < 1e-12);
        assert_eq!(split.left_indices, vec![0, 1]);
        assert_eq!(split.right_indices, vec![2, 3]);
        // 4 * 0.5 - 0 - 0
        assert!((split.impurity_decrease - 2.0).abs() < 1e-12);
    }

    #[test]
    fn constant_features_yield_no_split() {
        let features = vec![vec![3.0, 3.0, 3.0]];
        let labels = vec![0, 1, 0];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(
            find_best_split(&features, &labels, &[0, 1, 2], SplitCriterion::Gini, 1, &mut rng)
                .is_none()
        );
    }
}

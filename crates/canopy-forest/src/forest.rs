//! Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::config::{ForestConfig, MaxFeatures};
use crate::error::ForestError;
use crate::tree::{DecisionTree, TreeParams};

/// A fitted bagged-tree ensemble for binary classification.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) feature_names: Vec<String>,
    pub(crate) max_features: usize,
    pub(crate) min_node_size: usize,
}

/// Resolve `MaxFeatures` to a concrete count.
pub(crate) fn resolve_max_features(
    max_features: MaxFeatures,
    n_features: usize,
) -> Result<usize, ForestError> {
    let resolved = match max_features {
        MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
        MaxFeatures::Fixed(n) => n,
        MaxFeatures::All => n_features,
    };
    if resolved == 0 || resolved > n_features {
        return Err(ForestError::InvalidMaxFeatures {
            max_features: resolved,
            n_features,
        });
    }
    Ok(resolved)
}

/// Draw `n_samples` row indices with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

fn validate(
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<usize, ForestError> {
    if features.is_empty() {
        return Err(ForestError::EmptyDataset);
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(ForestError::ZeroFeatures);
    }
    if labels.len() != features.len() {
        return Err(ForestError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    if feature_names.len() != n_features {
        return Err(ForestError::FeatureNameMismatch {
            n_features,
            n_names: feature_names.len(),
        });
    }
    for (sample_index, (row, &label)) in features.iter().zip(labels).enumerate() {
        if label > 1 {
            return Err(ForestError::NonBinaryLabel {
                sample_index,
                label,
            });
        }
        if row.len() != n_features {
            return Err(ForestError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(ForestError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Train the forest.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &ForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForest, ForestError> {
    let n_features = validate(features, labels, feature_names)?;
    let max_features = resolve_max_features(config.max_features, n_features)?;
    if config.min_node_size < 2 {
        return Err(ForestError::InvalidMinNodeSize {
            min_node_size: config.min_node_size,
        });
    }
    let n_samples = features.len();

    debug!(
        n_samples,
        n_features,
        max_features,
        min_node_size = config.min_node_size,
        "training forest"
    );

    let col_features: Vec<Vec<f64>> = (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect();

    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let criterion = config.criterion;
    let min_node_size = config.min_node_size;

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bootstrap = bootstrap_sample(n_samples, &mut rng);
            let params = TreeParams {
                criterion,
                min_node_size,
                max_features,
                seed: rng.r#gen(),
            };
            DecisionTree::grow(&col_features, labels, &bootstrap, params)
        })
        .collect();

    debug!(n_trees_trained = trees.len(), "forest training complete");

    Ok(RandomForest {
        trees,
        n_features,
        feature_names: feature_names.to_vec(),
        max_features,
        min_node_size,
    })
}

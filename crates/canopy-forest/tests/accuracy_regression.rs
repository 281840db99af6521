//! Accuracy regression tests for canopy-forest.
//!
//! These tests verify that algorithmic changes do not degrade forest
//! classification quality on a deterministic synthetic dataset.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use canopy_forest::{ForestConfig, MaxFeatures};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic binary dataset
// ---------------------------------------------------------------------------

/// Generate a 200-sample, 8-feature binary classification dataset.
///
/// Features 0-1 are informative (class * 2.0 + noise in [0, 1.0]).
/// Features 2-7 are pure noise in [0, 1.0].
fn make_classification(seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_samples = 200;
    let n_features = 8;

    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % 2;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 2 { class as f64 * 2.0 } else { 0.0 };
                base + rng.r#gen::<f64>()
            })
            .collect();
        features.push(row);
    }
    let names: Vec<String> = (0..n_features).map(|f| format!("f{f}")).collect();
    (features, labels, names)
}

fn accuracy(predicted: &[usize], labels: &[usize]) -> f64 {
    let correct = predicted.iter().zip(labels).filter(|&(p, l)| p == l).count();
    correct as f64 / labels.len() as f64
}

/// Held-out accuracy must exceed 0.9 when trained on an independent draw.
#[test]
fn holdout_accuracy_above_threshold() {
    let (train_x, train_y, names) = make_classification(42);
    let (test_x, test_y, _) = make_classification(7);
    let forest = ForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&train_x, &train_y, &names)
        .unwrap();

    let acc = accuracy(&forest.predict_batch(&test_x).unwrap(), &test_y);
    assert!(acc > 0.9, "holdout accuracy {acc} <= 0.9");
}

/// The two informative features must rank above every noise feature.
#[test]
fn informative_features_dominate_importance() {
    let (features, labels, names) = make_classification(42);
    let forest = ForestConfig::new(100)
        .unwrap()
        .with_max_features(MaxFeatures::Fixed(3))
        .with_seed(42)
        .fit(&features, &labels, &names)
        .unwrap();

    let imp = forest.feature_importances();
    let weakest_signal = imp[0].min(imp[1]);
    let strongest_noise = imp[2..].iter().copied().fold(0.0, f64::max);
    assert!(
        weakest_signal > strongest_noise,
        "signal {weakest_signal} <= noise {strongest_noise}; importances = {imp:?}"
    );
}

/// Larger minimum node sizes produce smaller trees.
#[test]
fn min_node_size_shrinks_trees() {
    let (features, labels, names) = make_classification(42);
    let leaves = |min_node_size: usize| -> usize {
        ForestConfig::new(20)
            .unwrap()
            .with_min_node_size(min_node_size)
            .with_seed(3)
            .fit(&features, &labels, &names)
            .unwrap()
            .trees()
            .iter()
            .map(|t| t.n_leaves())
            .sum()
    };
    assert!(leaves(40) < leaves(2));
}

/// Same config and seed must produce identical probabilities across runs.
#[test]
fn deterministic_probabilities() {
    let (features, labels, names) = make_classification(42);
    let config = ForestConfig::new(50).unwrap().with_seed(11);

    let a = config.fit(&features, &labels, &names).unwrap();
    let b = config.fit(&features, &labels, &names).unwrap();

    assert_eq!(
        a.predict_proba_batch(&features).unwrap(),
        b.predict_proba_batch(&features).unwrap(),
        "probabilities differ across runs with the same seed"
    );
}

//! Label-stratified train/test splitting and fold assignment.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, instrument};

use crate::dataset::{ClassPair, Dataset};
use crate::error::TuneError;

/// Disjoint, exhaustive train/test index sets over one dataset.
///
/// Both index lists are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Split {
    train: Vec<usize>,
    test: Vec<usize>,
}

impl Split {
    /// Return the training indices.
    #[must_use]
    pub fn train(&self) -> &[usize] {
        &self.train
    }

    /// Return the test indices.
    #[must_use]
    pub fn test(&self) -> &[usize] {
        &self.test
    }
}

/// Stratified train/test splitter.
///
/// Construct via [`DataSplitter::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone)]
pub struct DataSplitter {
    proportion: f64,
    seed: u64,
}

impl DataSplitter {
    /// Create a splitter that places `proportion` of each class in `train`.
    ///
    /// # Errors
    ///
    /// Returns [`TuneError::InvalidProportion`] unless `0 < proportion < 1`.
    pub fn new(proportion: f64) -> Result<Self, TuneError> {
        if !(proportion > 0.0 && proportion < 1.0) {
            return Err(TuneError::InvalidProportion { proportion });
        }
        Ok(Self {
            proportion,
            seed: 42,
        })
    }

    /// Set the random seed for within-class shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Partition `dataset` into train and test indices.
    ///
    /// Within each class, `round(proportion * n)` shuffled records go to
    /// `train` (kept within `[1, n - 1]`) and the rest to `test`. The dataset
    /// itself is never touched.
    ///
    /// # Errors
    ///
    /// Returns [`TuneError::InsufficientData`] if a class has fewer than 2 records.
    #[instrument(skip_all, fields(proportion = self.proportion, n_records = dataset.n_records()))]
    pub fn split(&self, dataset: &Dataset) -> Result<Split, TuneError> {
        let by_class = indices_by_class(dataset.labels());
        for (label, indices) in by_class.iter().enumerate() {
            if indices.len() < 2 {
                return Err(TuneError::InsufficientData {
                    class: dataset.classes().name(label).to_string(),
                    count: indices.len(),
                });
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train = Vec::new();
        let mut test = Vec::new();
        for mut indices in by_class {
            indices.shuffle(&mut rng);
            let n = indices.len();
            let n_train = ((self.proportion * n as f64).round() as usize).clamp(1, n - 1);
            train.extend_from_slice(&indices[..n_train]);
            test.extend_from_slice(&indices[n_train..]);
        }
        train.sort_unstable();
        test.sort_unstable();

        info!(n_train = train.len(), n_test = test.len(), "stratified split complete");
        Ok(Split { train, test })
    }
}

/// Group record indices by label: `[negative, positive]`.
fn indices_by_class(labels: &[usize]) -> [Vec<usize>; 2] {
    let mut by_class = [Vec::new(), Vec::new()];
    for (i, &label) in labels.iter().enumerate() {
        by_class[label].push(i);
    }
    by_class
}

/// Assign each row to one of `n_folds` folds, stratified by label.
///
/// Shuffles within each class, then deals round-robin across folds so each
/// fold holds every class.
pub(crate) fn stratified_folds(
    labels: &[usize],
    classes: &ClassPair,
    n_folds: usize,
    seed: u64,
) -> Result<Vec<usize>, TuneError> {
    let by_class = indices_by_class(labels);
    for (label, indices) in by_class.iter().enumerate() {
        if indices.len() < n_folds {
            return Err(TuneError::InsufficientFoldSize {
                class: classes.name(label).to_string(),
                count: indices.len(),
                n_folds,
            });
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut assignments = vec![0usize; labels.len()];
    for mut indices in by_class {
        indices.shuffle(&mut rng);
        for (j, &idx) in indices.iter().enumerate() {
            assignments[idx] = j % n_folds;
        }
    }
    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n_a: usize, n_b: usize) -> Dataset {
        let n = n_a + n_b;
        let outcomes = (0..n)
            .map(|i| if i < n_a { "A" } else { "B" }.to_string())
            .collect();
        let ids = (0..n).map(|i| format!("r{i}")).collect();
        let features = (0..n).map(|i| vec![i as f64]).collect();
        Dataset::new(outcomes, ids, vec!["x".to_string()], features).unwrap()
    }

    fn count_label(ds: &Dataset, indices: &[usize], label: usize) -> usize {
        indices.iter().filter(|&&i| ds.labels()[i] == label).count()
    }

    #[test]
    fn six_four_split_at_eighty_percent() {
        let ds = dataset(6, 4);
        let split = DataSplitter::new(0.8).unwrap().split(&ds).unwrap();
        assert_eq!(split.train().len(), 8);
        assert_eq!(split.test().len(), 2);
        assert_eq!(count_label(&ds, split.train(), 0), 5);
        assert_eq!(count_label(&ds, split.train(), 1), 3);
        assert_eq!(count_label(&ds, split.test(), 0), 1);
        assert_eq!(count_label(&ds, split.test(), 1), 1);
    }

    #[test]
    fn splits_are_disjoint_exhaustive_and_proportional() {
        for &(n_a, n_b) in &[(2, 2), (7, 3), (25, 40), (101, 9)] {
            let ds = dataset(n_a, n_b);
            for &p in &[0.1, 0.25, 0.5, 0.66, 0.9] {
                for seed in 0..3 {
                    let split = DataSplitter::new(p).unwrap().with_seed(seed).split(&ds).unwrap();
                    let mut all: Vec<usize> =
                        split.train().iter().chain(split.test()).copied().collect();
                    all.sort_unstable();
                    assert_eq!(all, (0..n_a + n_b).collect::<Vec<_>>());

                    for (label, n) in [(0, n_a), (1, n_b)] {
                        let got = count_label(&ds, split.train(), label) as f64;
                        let target = p * n as f64;
                        assert!(
                            (got - target).abs() <= 1.0,
                            "class {label}: {got} train records, target {target}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn same_seed_same_split() {
        let ds = dataset(30, 20);
        let a = DataSplitter::new(0.7).unwrap().with_seed(5).split(&ds).unwrap();
        let b = DataSplitter::new(0.7).unwrap().with_seed(5).split(&ds).unwrap();
        let c = DataSplitter::new(0.7).unwrap().with_seed(6).split(&ds).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn proportion_bounds() {
        for p in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                DataSplitter::new(p),
                Err(TuneError::InvalidProportion { .. })
            ));
        }
    }

    #[test]
    fn single_record_class_rejected() {
        let ds = dataset(5, 1);
        let err = DataSplitter::new(0.5).unwrap().split(&ds).unwrap_err();
        assert!(matches!(
            err,
            TuneError::InsufficientData { ref class, count: 1 } if class == "B"
        ));
    }

    #[test]
    fn folds_hold_every_class() {
        let labels: Vec<usize> = (0..23).map(|i| usize::from(i % 3 == 0)).collect();
        let classes = ClassPair::new("a", "b");
        let folds = stratified_folds(&labels, &classes, 4, 9).unwrap();
        for fold in 0..4 {
            for label in 0..2 {
                assert!(
                    folds
                        .iter()
                        .zip(&labels)
                        .any(|(&f, &l)| f == fold && l == label),
                    "fold {fold} lacks class {label}"
                );
            }
        }
    }

    #[test]
    fn too_few_for_folds() {
        let labels = vec![0, 0, 1, 1, 1];
        let classes = ClassPair::new("a", "b");
        let err = stratified_folds(&labels, &classes, 3, 1).unwrap_err();
        assert!(matches!(
            err,
            TuneError::InsufficientFoldSize { ref class, count: 2, n_folds: 3 } if class == "a"
        ));
    }
}

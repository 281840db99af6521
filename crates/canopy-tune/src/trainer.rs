//! The forest-training collaborator seam.
//!
//! The tuner never builds trees itself. It hands a [`TrainRequest`] to a
//! [`ForestTrainer`] and scores whatever [`Ensemble`] comes back.
//! [`RandomForestTrainer`] is the production implementation over
//! `canopy-forest`.

use std::error::Error;

use canopy_forest::{ForestConfig, MaxFeatures, RandomForest, SplitCriterion};
use tracing::debug;

use crate::dataset::LabeledMatrix;
use crate::grid::HyperparameterCombination;

/// Boxed collaborator error carried through [`crate::TuneError`].
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// A trained ensemble as the tuner sees it.
pub trait Ensemble: Send + Sync {
    /// Positive-class probability for each row.
    ///
    /// # Errors
    ///
    /// Implementations fail when a row's width differs from the training width.
    fn predict_proba_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, BoxError>;

    /// Per-feature importance, in training column order.
    fn feature_importances(&self) -> Vec<f64>;

    /// Number of trees in the ensemble.
    fn n_trees(&self) -> usize;
}

/// Everything one training call needs.
#[derive(Debug, Clone, Copy)]
pub struct TrainRequest<'a> {
    /// Hyperparameters for this fit.
    pub combination: HyperparameterCombination,
    /// Ensemble size.
    pub n_trees: usize,
    /// Seed for bootstrap and feature sampling.
    pub seed: u64,
    /// Preprocessed training rows.
    pub matrix: &'a LabeledMatrix,
}

/// Trains one ensemble per request.
///
/// Implementations must be deterministic in the request: the same request
/// yields the same model.
pub trait ForestTrainer: Send + Sync {
    /// The ensemble type produced.
    type Model: Ensemble;

    /// Train an ensemble.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying learner, boxed.
    fn train(&self, request: &TrainRequest<'_>) -> Result<Self::Model, BoxError>;
}

impl Ensemble for RandomForest {
    fn predict_proba_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, BoxError> {
        Ok(RandomForest::predict_proba_batch(self, rows)?)
    }

    fn feature_importances(&self) -> Vec<f64> {
        RandomForest::feature_importances(self)
    }

    fn n_trees(&self) -> usize {
        RandomForest::n_trees(self)
    }
}

/// [`ForestTrainer`] backed by [`canopy_forest::RandomForest`].
///
/// Features-per-split is clipped to the matrix width, and the minimum leaf
/// size becomes the minimum node size required to split (at least 2).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomForestTrainer {
    criterion: SplitCriterion,
}

impl RandomForestTrainer {
    /// Create a trainer using Gini impurity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the split criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }
}

impl ForestTrainer for RandomForestTrainer {
    type Model = RandomForest;

    fn train(&self, request: &TrainRequest<'_>) -> Result<RandomForest, BoxError> {
        let matrix = request.matrix;
        let mtry = request
            .combination
            .features_per_split
            .clamp(1, matrix.n_features().max(1));
        let min_node_size = request.combination.min_leaf_size.max(2);
        debug!(
            mtry,
            min_node_size,
            n_rows = matrix.n_rows(),
            "training forest"
        );

        let forest = ForestConfig::new(request.n_trees)?
            .with_max_features(MaxFeatures::Fixed(mtry))
            .with_min_node_size(min_node_size)
            .with_criterion(self.criterion)
            .with_seed(request.seed)
            .fit(
                matrix.rows(),
                matrix.labels(),
                matrix.schema().feature_names(),
            )?;
        Ok(forest)
    }
}

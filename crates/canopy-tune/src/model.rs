//! The final model and its predictions.

use serde::Serialize;
use tracing::{info, instrument};

use crate::dataset::{ClassPair, LabeledMatrix};
use crate::error::TuneError;
use crate::grid::HyperparameterCombination;
use crate::metrics::{ClassificationMetrics, evaluate};
use crate::preprocess::FittedPreprocessor;
use crate::trainer::{Ensemble, ForestTrainer, TrainRequest};

/// Positive-class probability at or above which a record is labeled positive.
pub(crate) const DECISION_THRESHOLD: f64 = 0.5;

/// Label each probability with the decision threshold.
pub(crate) fn classify(probabilities: &[f64]) -> Vec<usize> {
    probabilities
        .iter()
        .map(|&p| usize::from(p >= DECISION_THRESHOLD))
        .collect()
}

/// An ensemble bound to its hyperparameters and the preprocessing that
/// produced its training inputs. Immutable once trained.
#[derive(Debug, Clone)]
pub struct TrainedModel<M> {
    ensemble: M,
    combination: HyperparameterCombination,
    preprocessor: FittedPreprocessor,
}

impl<M: Ensemble> TrainedModel<M> {
    /// Train the final ensemble on an already-transformed training matrix.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::SchemaMismatch`] | `train` is not in `preprocessor`'s output schema |
    /// | [`TuneError::FinalModel`] | The trainer fails |
    #[instrument(skip_all, fields(combination = %combination, n_trees = n_trees, n_rows = train.n_rows()))]
    pub fn train<T: ForestTrainer<Model = M>>(
        trainer: &T,
        preprocessor: FittedPreprocessor,
        train: &LabeledMatrix,
        combination: HyperparameterCombination,
        n_trees: usize,
        seed: u64,
    ) -> Result<Self, TuneError> {
        if train.schema() != preprocessor.output_schema() {
            return Err(TuneError::SchemaMismatch {
                expected: preprocessor.output_schema().feature_names().to_vec(),
                found: train.schema().feature_names().to_vec(),
            });
        }
        let ensemble = trainer
            .train(&TrainRequest {
                combination,
                n_trees,
                seed,
                matrix: train,
            })
            .map_err(|source| TuneError::FinalModel {
                combination,
                source,
            })?;
        info!(n_trees = ensemble.n_trees(), "final model trained");
        Ok(Self {
            ensemble,
            combination,
            preprocessor,
        })
    }

    /// Preprocess `raw` with the fitted parameters and predict every row.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::SchemaMismatch`] | `raw` does not match the fit-time schema |
    /// | [`TuneError::FinalModel`] | The ensemble fails to predict |
    pub fn predict(&self, raw: &LabeledMatrix) -> Result<PredictionSet, TuneError> {
        let matrix = self.preprocessor.transform(raw)?;
        let probabilities = self
            .ensemble
            .predict_proba_batch(matrix.rows())
            .map_err(|source| TuneError::FinalModel {
                combination: self.combination,
                source,
            })?;
        let classes = matrix.classes();
        let predictions = matrix
            .ids()
            .iter()
            .zip(matrix.labels())
            .zip(probabilities.iter().zip(classify(&probabilities)))
            .map(|((id, &truth), (&probability, predicted))| Prediction {
                id: id.clone(),
                truth: classes.name(truth).to_string(),
                predicted: classes.name(predicted).to_string(),
                probability,
            })
            .collect();
        Ok(PredictionSet {
            predictions,
            classes: classes.clone(),
        })
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.ensemble.n_trees()
    }
}

impl<M> TrainedModel<M> {
    /// Return the underlying ensemble.
    #[must_use]
    pub fn ensemble(&self) -> &M {
        &self.ensemble
    }

    /// Return the hyperparameters the ensemble was trained with.
    #[must_use]
    pub fn combination(&self) -> HyperparameterCombination {
        self.combination
    }

    /// Return the fitted preprocessing.
    #[must_use]
    pub fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }

    /// Return the feature names the ensemble sees, in column order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        self.preprocessor.output_schema().feature_names()
    }
}

/// One scored record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Record identifier.
    pub id: String,
    /// True class name.
    pub truth: String,
    /// Predicted class name.
    pub predicted: String,
    /// Predicted probability of the positive class.
    pub probability: f64,
}

/// Predictions for one partition, in record order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSet {
    predictions: Vec<Prediction>,
    classes: ClassPair,
}

impl PredictionSet {
    /// Return the predictions.
    #[must_use]
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    /// Return the class pair.
    #[must_use]
    pub fn classes(&self) -> &ClassPair {
        &self.classes
    }

    /// Return the number of predictions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    /// Return `true` if there are no predictions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Score the predictions against their true labels.
    ///
    /// # Errors
    ///
    /// Returns [`TuneError::EmptyInput`] for an empty set.
    pub fn evaluate(&self) -> Result<ClassificationMetrics, TuneError> {
        let positive = self.classes.positive();
        let label = |name: &str| usize::from(name == positive);
        let truth: Vec<usize> = self.predictions.iter().map(|p| label(&p.truth)).collect();
        let predicted: Vec<usize> = self.predictions.iter().map(|p| label(&p.predicted)).collect();
        let probabilities: Vec<f64> = self.predictions.iter().map(|p| p.probability).collect();
        evaluate(&truth, &predicted, Some(&probabilities))
    }
}

//! Tuning and evaluation pipeline for bagged-tree binary classifiers.
//!
//! Splits a labeled dataset with class stratification, fits a four-stage
//! preprocessing chain on training data only, searches a regular
//! hyperparameter grid with repeated stratified k-fold cross-validation,
//! refits the selected combination, scores it on the held-out partition,
//! and ranks feature importances from the final ensemble.
//!
//! Forest training is a collaborator behind the [`ForestTrainer`] trait;
//! [`RandomForestTrainer`] adapts `canopy-forest` to it.

mod config;
mod dataset;
mod error;
mod grid;
mod importance;
mod metrics;
mod model;
mod pipeline;
mod preprocess;
mod seed;
mod split;
mod trainer;
mod tuner;

pub use config::PipelineConfig;
pub use dataset::{ClassPair, Dataset, LabeledMatrix, NEGATIVE, POSITIVE, Schema};
pub use error::TuneError;
pub use grid::{HyperparameterCombination, HyperparameterGrid};
pub use importance::{ImportanceRanker, ImportanceReport, RankedFeature};
pub use metrics::{ClassificationMetrics, ConfusionMatrix, MetricKind, brier_score, evaluate, roc_auc};
pub use model::{Prediction, PredictionSet, TrainedModel};
pub use pipeline::{Pipeline, PipelineReport};
pub use preprocess::{FittedPreprocessor, Preprocessor};
pub use split::{DataSplitter, Split};
pub use trainer::{BoxError, Ensemble, ForestTrainer, RandomForestTrainer, TrainRequest};
pub use tuner::{
    CancelToken, CrossValidatedTuner, FoldResult, MetricSummary, SummaryRow, TuningSummary,
};

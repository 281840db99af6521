//! The end-to-end run: split, preprocess, tune, refit, evaluate, rank.

use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::TuneError;
use crate::grid::HyperparameterGrid;
use crate::importance::ImportanceReport;
use crate::metrics::ClassificationMetrics;
use crate::model::{PredictionSet, TrainedModel};
use crate::preprocess::FittedPreprocessor;
use crate::seed;
use crate::split::Split;
use crate::trainer::ForestTrainer;
use crate::tuner::{CancelToken, TuningSummary};

/// Every artifact one run produces.
#[derive(Debug, Clone)]
pub struct PipelineReport<M> {
    /// Train/test record indices into the input dataset.
    pub split: Split,
    /// `[negative, positive]` counts in the training partition.
    pub train_class_counts: [usize; 2],
    /// `[negative, positive]` counts in the test partition.
    pub test_class_counts: [usize; 2],
    /// The grid that was searched.
    pub grid: HyperparameterGrid,
    /// Cross-validated metrics per combination and the selection.
    pub tuning: TuningSummary,
    /// The final model, refitted on the whole training partition.
    pub model: TrainedModel<M>,
    /// Held-out predictions of the final model.
    pub predictions: PredictionSet,
    /// Held-out metrics of the final model.
    pub metrics: ClassificationMetrics,
    /// Ranked importances of the final model.
    pub importance: ImportanceReport,
}

impl<M> PipelineReport<M> {
    /// Return the preprocessing fitted on the whole training partition.
    #[must_use]
    pub fn preprocessor(&self) -> &FittedPreprocessor {
        self.model.preprocessor()
    }
}

/// A configured pipeline bound to a forest trainer.
#[derive(Debug, Clone)]
pub struct Pipeline<T> {
    config: PipelineConfig,
    trainer: T,
    cancel: CancelToken,
}

impl<T: ForestTrainer> Pipeline<T> {
    /// Create a pipeline after validating `config`.
    ///
    /// # Errors
    ///
    /// Any precondition variant from [`PipelineConfig::validate`].
    pub fn new(config: PipelineConfig, trainer: T) -> Result<Self, TuneError> {
        config.validate()?;
        Ok(Self {
            config,
            trainer,
            cancel: CancelToken::new(),
        })
    }

    /// Observe `cancel` during tuning.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on `dataset`.
    ///
    /// Preprocessing for the final model is fitted on the training partition
    /// only; the test partition is transformed with those parameters and
    /// touched by nothing else.
    ///
    /// # Errors
    ///
    /// Propagates the first error of any stage: [`crate::DataSplitter::split`],
    /// [`crate::Preprocessor::fit`], [`HyperparameterGrid::regular`],
    /// [`crate::CrossValidatedTuner::tune`], [`TrainedModel::train`], or
    /// [`TrainedModel::predict`].
    #[instrument(skip_all, fields(
        n_records = dataset.n_records(),
        n_features = dataset.schema().n_features(),
        seed = self.config.seed
    ))]
    pub fn run(&self, dataset: &Dataset) -> Result<PipelineReport<T::Model>, TuneError> {
        let config = &self.config;
        let split = config.splitter()?.split(dataset)?;
        let train_raw = dataset.select(split.train());
        let test_raw = dataset.select(split.test());

        let (fitted, train) = config
            .preprocessor()?
            .fit(&train_raw, seed::derive(config.seed, seed::RESAMPLE, &[seed::FULL_TRAIN]))?;
        let grid = HyperparameterGrid::regular(fitted.output_schema().n_features(), config.grid_levels)?;
        info!(grid_size = grid.len(), "grid built");

        let tuning = config
            .tuner()?
            .tune(&self.trainer, &train_raw, &grid, &self.cancel)?;
        if self.cancel.is_cancelled() {
            return Err(TuneError::Cancelled);
        }

        let model = TrainedModel::train(
            &self.trainer,
            fitted,
            &train,
            tuning.best(),
            config.n_trees,
            seed::derive(config.seed, seed::TRAIN, &[seed::FULL_TRAIN]),
        )?;
        let predictions = model.predict(&test_raw)?;
        let metrics = predictions.evaluate()?;
        let importance = config.ranker()?.rank(&model)?;

        info!(
            n_train = train_raw.n_rows(),
            n_test = test_raw.n_rows(),
            accuracy = metrics.accuracy,
            mcc = metrics.mcc,
            roc_auc = metrics.roc_auc,
            "held-out evaluation complete"
        );
        Ok(PipelineReport {
            train_class_counts: train_raw.class_counts(),
            test_class_counts: test_raw.class_counts(),
            split,
            grid,
            tuning,
            model,
            predictions,
            metrics,
            importance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::RandomForestTrainer;

    fn dataset() -> Dataset {
        let n = 60;
        let outcomes = (0..n).map(|i| if i % 3 == 0 { "case" } else { "control" }.to_string()).collect();
        let ids = (0..n).map(|i| format!("s{i:02}")).collect();
        let features = (0..n)
            .map(|i| {
                let signal = if i % 3 == 0 { 3.0 } else { 0.0 };
                vec![signal + (i % 7) as f64 * 0.2, (i % 11) as f64, ((i * 5) % 9) as f64]
            })
            .collect();
        Dataset::new(outcomes, ids, vec!["a".into(), "b".into(), "c".into()], features).unwrap()
    }

    fn config() -> PipelineConfig {
        PipelineConfig::new()
            .with_n_folds(3)
            .with_n_trees(15)
            .with_grid_levels(2, 2)
            .with_workers(2)
    }

    #[test]
    fn produces_every_artifact() {
        let pipeline = Pipeline::new(config(), RandomForestTrainer::new()).unwrap();
        let report = pipeline.run(&dataset()).unwrap();

        assert_eq!(report.split.train().len() + report.split.test().len(), 60);
        // "case" sorts first, so it is the negative class.
        assert_eq!(report.train_class_counts, [15, 30]);
        assert_eq!(report.test_class_counts, [5, 10]);
        assert_eq!(report.tuning.rows().len(), report.grid.len());
        assert_eq!(report.predictions.len(), 15);
        assert_eq!(report.model.combination(), report.tuning.best());
        assert_eq!(report.model.n_trees(), 15);
        assert!(report.importance.features().len() <= 3);
        assert_eq!(report.importance.features()[0].rank, 1);
        assert!((0.0..=1.0).contains(&report.metrics.accuracy));
    }

    #[test]
    fn invalid_config_rejected_up_front() {
        let err = Pipeline::new(config().with_n_folds(0), RandomForestTrainer::new()).unwrap_err();
        assert!(matches!(err, TuneError::InvalidFoldCount { n_folds: 0 }));
    }

    #[test]
    fn cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let pipeline = Pipeline::new(config(), RandomForestTrainer::new())
            .unwrap()
            .with_cancel_token(cancel);
        assert!(matches!(pipeline.run(&dataset()), Err(TuneError::Cancelled)));
    }
}

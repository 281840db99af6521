//! End-to-end pipeline configuration.

use serde::Serialize;

use crate::error::TuneError;
use crate::importance::ImportanceRanker;
use crate::metrics::MetricKind;
use crate::preprocess::Preprocessor;
use crate::seed;
use crate::split::DataSplitter;
use crate::tuner::CrossValidatedTuner;

/// Every knob of a pipeline run.
///
/// Construct via [`PipelineConfig::new`] (all defaults), chain `with_*`
/// setters, and call [`PipelineConfig::validate`] or let
/// [`crate::Pipeline::run`] do it before any computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub(crate) split_proportion: f64,
    pub(crate) n_folds: usize,
    pub(crate) n_repeats: usize,
    pub(crate) correlation_threshold: f64,
    pub(crate) resample_ratio: f64,
    pub(crate) n_trees: usize,
    pub(crate) grid_levels: (usize, usize),
    pub(crate) selection_metric: MetricKind,
    pub(crate) metrics: Vec<MetricKind>,
    pub(crate) seed: u64,
    pub(crate) workers: Option<usize>,
    pub(crate) top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            split_proportion: 0.75,
            n_folds: 10,
            n_repeats: 1,
            correlation_threshold: 0.99,
            resample_ratio: 1.0,
            n_trees: 500,
            grid_levels: (5, 5),
            selection_metric: MetricKind::Mcc,
            metrics: MetricKind::ALL.to_vec(),
            seed: 42,
            workers: None,
            top_n: 16,
        }
    }
}

impl PipelineConfig {
    /// Create a config with every default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fraction of each class placed in the training partition.
    #[must_use]
    pub fn with_split_proportion(mut self, split_proportion: f64) -> Self {
        self.split_proportion = split_proportion;
        self
    }

    /// Set the cross-validation fold count.
    #[must_use]
    pub fn with_n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    /// Set how many times the fold assignment is redrawn.
    #[must_use]
    pub fn with_n_repeats(mut self, n_repeats: usize) -> Self {
        self.n_repeats = n_repeats;
        self
    }

    /// Set the absolute-correlation threshold of the correlation filter.
    #[must_use]
    pub fn with_correlation_threshold(mut self, correlation_threshold: f64) -> Self {
        self.correlation_threshold = correlation_threshold;
        self
    }

    /// Set the target minority/majority ratio after upsampling.
    #[must_use]
    pub fn with_resample_ratio(mut self, resample_ratio: f64) -> Self {
        self.resample_ratio = resample_ratio;
        self
    }

    /// Set the ensemble size.
    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Set the level counts for features-per-split and minimum leaf size.
    #[must_use]
    pub fn with_grid_levels(mut self, features_per_split: usize, min_leaf_size: usize) -> Self {
        self.grid_levels = (features_per_split, min_leaf_size);
        self
    }

    /// Set the metric that selects the best combination.
    #[must_use]
    pub fn with_selection_metric(mut self, selection_metric: MetricKind) -> Self {
        self.selection_metric = selection_metric;
        self
    }

    /// Set the metrics computed per fold.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Vec<MetricKind>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set the master seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Bound tuning to a dedicated pool of `workers` threads.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Set how many features the importance report keeps.
    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Return the train proportion.
    #[must_use]
    pub fn split_proportion(&self) -> f64 {
        self.split_proportion
    }

    /// Return the fold count.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Return the repeat count.
    #[must_use]
    pub fn n_repeats(&self) -> usize {
        self.n_repeats
    }

    /// Return the correlation threshold.
    #[must_use]
    pub fn correlation_threshold(&self) -> f64 {
        self.correlation_threshold
    }

    /// Return the resample ratio.
    #[must_use]
    pub fn resample_ratio(&self) -> f64 {
        self.resample_ratio
    }

    /// Return the ensemble size.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the grid level counts.
    #[must_use]
    pub fn grid_levels(&self) -> (usize, usize) {
        self.grid_levels
    }

    /// Return the selection metric.
    #[must_use]
    pub fn selection_metric(&self) -> MetricKind {
        self.selection_metric
    }

    /// Return the per-fold metrics.
    #[must_use]
    pub fn metrics(&self) -> &[MetricKind] {
        &self.metrics
    }

    /// Return the master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the worker bound, if any.
    #[must_use]
    pub fn workers(&self) -> Option<usize> {
        self.workers
    }

    /// Return the importance report length.
    #[must_use]
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::InvalidProportion`] | Split proportion outside `(0, 1)` |
    /// | [`TuneError::InvalidFoldCount`] | Fewer than 2 folds |
    /// | [`TuneError::InvalidRepeatCount`] | Zero repeats |
    /// | [`TuneError::InvalidCorrelationThreshold`] | Threshold outside `[0, 1]` |
    /// | [`TuneError::InvalidResampleRatio`] | Ratio outside `(0, 1]` |
    /// | [`TuneError::InvalidTreeCount`] | Zero trees |
    /// | [`TuneError::InvalidGridLevels`] | A level count is zero |
    /// | [`TuneError::InvalidTopN`] | Zero-length importance report |
    /// | [`TuneError::SelectionMetricNotInSet`] | Selection metric not among the per-fold metrics |
    pub fn validate(&self) -> Result<(), TuneError> {
        self.splitter()?;
        self.tuner()?;
        if self.n_trees == 0 {
            return Err(TuneError::InvalidTreeCount {
                n_trees: self.n_trees,
            });
        }
        if self.grid_levels.0 == 0 || self.grid_levels.1 == 0 {
            return Err(TuneError::InvalidGridLevels {
                features_per_split: self.grid_levels.0,
                min_leaf_size: self.grid_levels.1,
            });
        }
        self.ranker()?;
        if !self.metrics.contains(&self.selection_metric) {
            return Err(TuneError::SelectionMetricNotInSet {
                metric: self.selection_metric,
            });
        }
        Ok(())
    }

    pub(crate) fn splitter(&self) -> Result<DataSplitter, TuneError> {
        Ok(DataSplitter::new(self.split_proportion)?.with_seed(seed::derive(self.seed, seed::SPLIT, &[])))
    }

    pub(crate) fn preprocessor(&self) -> Result<Preprocessor, TuneError> {
        Preprocessor::new(self.correlation_threshold, self.resample_ratio)
    }

    pub(crate) fn tuner(&self) -> Result<CrossValidatedTuner, TuneError> {
        let tuner = CrossValidatedTuner::new(self.n_folds, self.n_repeats)?
            .with_metrics(self.metrics.clone())
            .with_selection_metric(self.selection_metric)
            .with_n_trees(self.n_trees)
            .with_seed(self.seed)
            .with_preprocessor(self.preprocessor()?);
        Ok(match self.workers {
            Some(workers) => tuner.with_workers(workers),
            None => tuner,
        })
    }

    pub(crate) fn ranker(&self) -> Result<ImportanceRanker, TuneError> {
        ImportanceRanker::new(self.top_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::new();
        assert_eq!(config.split_proportion(), 0.75);
        assert_eq!(config.n_folds(), 10);
        assert_eq!(config.n_repeats(), 1);
        assert_eq!(config.correlation_threshold(), 0.99);
        assert_eq!(config.resample_ratio(), 1.0);
        assert_eq!(config.n_trees(), 500);
        assert_eq!(config.grid_levels(), (5, 5));
        assert_eq!(config.selection_metric(), MetricKind::Mcc);
        assert_eq!(config.metrics(), &MetricKind::ALL);
        assert_eq!(config.seed(), 42);
        assert_eq!(config.workers(), None);
        assert_eq!(config.top_n(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn each_field_validated() {
        let cases = [
            (PipelineConfig::new().with_split_proportion(1.0), "InvalidProportion"),
            (PipelineConfig::new().with_n_folds(1), "InvalidFoldCount"),
            (PipelineConfig::new().with_n_repeats(0), "InvalidRepeatCount"),
            (
                PipelineConfig::new().with_correlation_threshold(-0.1),
                "InvalidCorrelationThreshold",
            ),
            (PipelineConfig::new().with_resample_ratio(2.0), "InvalidResampleRatio"),
            (PipelineConfig::new().with_n_trees(0), "InvalidTreeCount"),
            (PipelineConfig::new().with_grid_levels(3, 0), "InvalidGridLevels"),
            (PipelineConfig::new().with_top_n(0), "InvalidTopN"),
            (
                PipelineConfig::new()
                    .with_metrics(vec![MetricKind::Accuracy])
                    .with_selection_metric(MetricKind::Brier),
                "SelectionMetricNotInSet",
            ),
        ];
        for (config, variant) in cases {
            let err = config.validate().unwrap_err();
            assert!(format!("{err:?}").starts_with(variant), "{config:?} gave {err:?}");
        }
    }
}

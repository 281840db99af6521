//! Repeated stratified k-fold grid search.
//!
//! Each (repeat, fold, combination) triple is an independent unit: it reads
//! one fold's preprocessed analysis and assessment matrices and produces one
//! [`FoldResult`]. Folds are prepared one at a time and their units are
//! dispatched across a rayon pool; the only synchronization point is the
//! final reduction, which runs over results sorted by coordinate so the
//! summary is identical for any worker count.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::ThreadPoolBuilder;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::dataset::LabeledMatrix;
use crate::error::TuneError;
use crate::grid::{HyperparameterCombination, HyperparameterGrid};
use crate::metrics::{MetricKind, evaluate};
use crate::model::classify;
use crate::preprocess::Preprocessor;
use crate::seed;
use crate::split::stratified_folds;
use crate::trainer::{BoxError, Ensemble, ForestTrainer, TrainRequest};

/// Cooperative cancellation flag shared between a run and its caller.
///
/// Checked before each unit starts; units already running finish, and the
/// run then returns [`TuneError::Cancelled`] without aggregating anything.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Return `true` once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Metrics of one combination on one held-out fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldResult {
    /// The combination evaluated.
    pub combination: HyperparameterCombination,
    /// Zero-based repeat index.
    pub repeat: usize,
    /// Zero-based fold index within the repeat.
    pub fold: usize,
    /// Metric values on the held-out fold.
    pub metrics: BTreeMap<MetricKind, f64>,
}

/// Mean and standard error of one metric across folds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Mean over finite fold values; `NaN` if there are none.
    pub mean: f64,
    /// Sample standard deviation over `sqrt(n)`; `NaN` when `n < 2`.
    pub std_err: f64,
    /// Number of finite fold values.
    pub n: usize,
}

impl MetricSummary {
    fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        let n = finite.len();
        if n == 0 {
            return Self {
                mean: f64::NAN,
                std_err: f64::NAN,
                n,
            };
        }
        let mean = finite.iter().sum::<f64>() / n as f64;
        let std_err = if n < 2 {
            f64::NAN
        } else {
            let var = finite.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1) as f64;
            var.sqrt() / (n as f64).sqrt()
        };
        Self { mean, std_err, n }
    }
}

/// Aggregated metrics for one combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// The combination.
    pub combination: HyperparameterCombination,
    /// Number of folds evaluated (`k * r`).
    pub n_folds: usize,
    /// Summary per metric.
    pub metrics: BTreeMap<MetricKind, MetricSummary>,
}

impl SummaryRow {
    /// Return the mean of `kind`, or `NaN` if it was not evaluated.
    #[must_use]
    pub fn mean(&self, kind: MetricKind) -> f64 {
        self.metrics.get(&kind).map_or(f64::NAN, |s| s.mean)
    }
}

/// Outcome of a tuning run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuningSummary {
    rows: Vec<SummaryRow>,
    selection_metric: MetricKind,
    best: HyperparameterCombination,
    fold_results: Vec<FoldResult>,
}

impl TuningSummary {
    /// Return one row per grid combination, in grid order.
    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Return the metric the best combination was chosen by.
    #[must_use]
    pub fn selection_metric(&self) -> MetricKind {
        self.selection_metric
    }

    /// Return the selected combination.
    #[must_use]
    pub fn best(&self) -> HyperparameterCombination {
        self.best
    }

    /// Return the summary row of the selected combination.
    #[must_use]
    pub fn best_row(&self) -> Option<&SummaryRow> {
        self.row(self.best)
    }

    /// Return the summary row of `combination`, if it was in the grid.
    #[must_use]
    pub fn row(&self, combination: HyperparameterCombination) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.combination == combination)
    }

    /// Return every per-fold result, sorted by combination, repeat, and fold.
    #[must_use]
    pub fn fold_results(&self) -> &[FoldResult] {
        &self.fold_results
    }
}

/// One fold's preprocessed matrices, shared read-only by its units.
struct FoldData {
    repeat: usize,
    fold: usize,
    analysis: LabeledMatrix,
    assessment: LabeledMatrix,
}

/// Repeated stratified k-fold tuner.
///
/// Construct via [`CrossValidatedTuner::new`], then chain `with_*` setters.
#[derive(Debug, Clone)]
pub struct CrossValidatedTuner {
    n_folds: usize,
    n_repeats: usize,
    metrics: Vec<MetricKind>,
    selection_metric: MetricKind,
    n_trees: usize,
    seed: u64,
    workers: Option<usize>,
    preprocessor: Preprocessor,
}

impl CrossValidatedTuner {
    /// Create a tuner with `n_folds` folds repeated `n_repeats` times.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::InvalidFoldCount`] | `n_folds < 2` |
    /// | [`TuneError::InvalidRepeatCount`] | `n_repeats == 0` |
    pub fn new(n_folds: usize, n_repeats: usize) -> Result<Self, TuneError> {
        if n_folds < 2 {
            return Err(TuneError::InvalidFoldCount { n_folds });
        }
        if n_repeats == 0 {
            return Err(TuneError::InvalidRepeatCount { n_repeats });
        }
        Ok(Self {
            n_folds,
            n_repeats,
            metrics: MetricKind::ALL.to_vec(),
            selection_metric: MetricKind::Mcc,
            n_trees: 500,
            seed: 42,
            workers: None,
            preprocessor: Preprocessor::default(),
        })
    }

    /// Set the metrics computed on every fold.
    #[must_use]
    pub fn with_metrics(mut self, mut metrics: Vec<MetricKind>) -> Self {
        metrics.sort_unstable();
        metrics.dedup();
        self.metrics = metrics;
        self
    }

    /// Set the metric whose mean picks the best combination.
    #[must_use]
    pub fn with_selection_metric(mut self, metric: MetricKind) -> Self {
        self.selection_metric = metric;
        self
    }

    /// Set the ensemble size used for every unit.
    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Set the master seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Bound the run to a dedicated pool of `workers` threads.
    ///
    /// Without this the run uses the current rayon pool. Zero means one
    /// thread per core.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Set the preprocessing refitted on each fold's analysis rows.
    #[must_use]
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
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

    /// Return the evaluated metrics.
    #[must_use]
    pub fn metrics(&self) -> &[MetricKind] {
        &self.metrics
    }

    /// Return the selection metric.
    #[must_use]
    pub fn selection_metric(&self) -> MetricKind {
        self.selection_metric
    }

    /// Evaluate every grid combination on every fold of every repeat.
    ///
    /// `train` is the raw (unpreprocessed) training partition. For each
    /// (repeat, fold) the preprocessor is fitted on the analysis folds only
    /// and applied to the held-out fold, so no held-out row ever informs its
    /// own preprocessing. Every combination sees the same folds within a
    /// repeat. Any failing unit fails the run.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::EmptyGrid`] | `grid` has no combinations |
    /// | [`TuneError::InvalidTreeCount`] | Tree count is zero |
    /// | [`TuneError::SelectionMetricNotInSet`] | Selection metric not evaluated |
    /// | [`TuneError::InsufficientFoldSize`] | A class has fewer rows than folds |
    /// | [`TuneError::NoFeaturesRetained`], [`TuneError::DegenerateFeature`] | A fold's preprocessing fit fails |
    /// | [`TuneError::Trainer`] | A unit's training or prediction fails |
    /// | [`TuneError::WorkerPool`] | The bounded pool cannot be built |
    /// | [`TuneError::Cancelled`] | `cancel` was set before the run finished |
    #[instrument(skip_all, fields(
        n_folds = self.n_folds,
        n_repeats = self.n_repeats,
        grid_size = grid.len(),
        n_rows = train.n_rows()
    ))]
    pub fn tune<T: ForestTrainer>(
        &self,
        trainer: &T,
        train: &LabeledMatrix,
        grid: &HyperparameterGrid,
        cancel: &CancelToken,
    ) -> Result<TuningSummary, TuneError> {
        if grid.is_empty() {
            return Err(TuneError::EmptyGrid);
        }
        if self.n_trees == 0 {
            return Err(TuneError::InvalidTreeCount {
                n_trees: self.n_trees,
            });
        }
        if !self.metrics.contains(&self.selection_metric) {
            return Err(TuneError::SelectionMetricNotInSet {
                metric: self.selection_metric,
            });
        }
        let assignments = (0..self.n_repeats)
            .map(|repeat| {
                let fold_seed = seed::derive(self.seed, seed::FOLDS, &[repeat as u64]);
                stratified_folds(train.labels(), train.classes(), self.n_folds, fold_seed)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let run = || self.run_units(trainer, train, grid, &assignments, cancel);
        let mut results = match self.workers {
            Some(workers) => ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|source| TuneError::WorkerPool { source })?
                .install(run)?,
            None => run()?,
        };
        if cancel.is_cancelled() {
            return Err(TuneError::Cancelled);
        }

        results.sort_by_key(|(c, r)| (*c, r.repeat, r.fold));
        let rows = summarize(&results, grid, &self.metrics);
        let best = select_best(&rows, self.selection_metric).ok_or(TuneError::EmptyGrid)?;
        let summary = TuningSummary {
            rows,
            selection_metric: self.selection_metric,
            best,
            fold_results: results.into_iter().map(|(_, r)| r).collect(),
        };
        info!(
            best_mtry = best.features_per_split,
            best_min_n = best.min_leaf_size,
            metric = %self.selection_metric,
            mean = summary.best_row().map_or(f64::NAN, |r| r.mean(self.selection_metric)),
            "tuning complete"
        );
        Ok(summary)
    }

    /// Walk the (repeat, fold) pairs in order; within each, preprocess once and
    /// evaluate every combination in parallel. Only one fold's matrices are
    /// alive at a time.
    fn run_units<T: ForestTrainer>(
        &self,
        trainer: &T,
        train: &LabeledMatrix,
        grid: &HyperparameterGrid,
        assignments: &[Vec<usize>],
        cancel: &CancelToken,
    ) -> Result<Vec<(usize, FoldResult)>, TuneError> {
        let mut results = Vec::with_capacity(self.n_repeats * self.n_folds * grid.len());
        for (repeat, assignment) in assignments.iter().enumerate() {
            for fold in 0..self.n_folds {
                let data = self.prepare_fold(train, assignment, repeat, fold, cancel)?;
                let fold_results = (0..grid.len())
                    .into_par_iter()
                    .map(|c| {
                        let combination = grid.combinations()[c];
                        self.evaluate_unit(trainer, &data, c, combination, cancel)
                            .map(|result| (c, result))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                results.extend(fold_results);
            }
        }
        Ok(results)
    }

    fn prepare_fold(
        &self,
        train: &LabeledMatrix,
        assignment: &[usize],
        repeat: usize,
        fold: usize,
        cancel: &CancelToken,
    ) -> Result<FoldData, TuneError> {
        if cancel.is_cancelled() {
            return Err(TuneError::Cancelled);
        }
        let (analysis_idx, assessment_idx): (Vec<usize>, Vec<usize>) =
            (0..train.n_rows()).partition(|&i| assignment[i] != fold);
        let resample_seed = seed::derive(self.seed, seed::RESAMPLE, &[repeat as u64, fold as u64]);
        let (fitted, analysis) = self
            .preprocessor
            .fit(&train.select(&analysis_idx), resample_seed)?;
        let assessment = fitted.transform(&train.select(&assessment_idx))?;
        Ok(FoldData {
            repeat,
            fold,
            analysis,
            assessment,
        })
    }

    fn evaluate_unit<T: ForestTrainer>(
        &self,
        trainer: &T,
        data: &FoldData,
        combination_index: usize,
        combination: HyperparameterCombination,
        cancel: &CancelToken,
    ) -> Result<FoldResult, TuneError> {
        if cancel.is_cancelled() {
            return Err(TuneError::Cancelled);
        }
        let unit_error = |source: BoxError| TuneError::Trainer {
            repeat: data.repeat,
            fold: data.fold,
            combination,
            source,
        };
        let request = TrainRequest {
            combination,
            n_trees: self.n_trees,
            seed: seed::derive(
                self.seed,
                seed::TRAIN,
                &[data.repeat as u64, data.fold as u64, combination_index as u64],
            ),
            matrix: &data.analysis,
        };
        let model = trainer.train(&request).map_err(&unit_error)?;
        let probabilities = model
            .predict_proba_batch(data.assessment.rows())
            .map_err(&unit_error)?;
        let predicted = classify(&probabilities);
        let all = evaluate(data.assessment.labels(), &predicted, Some(&probabilities))?;

        debug!(
            repeat = data.repeat,
            fold = data.fold,
            %combination,
            mcc = all.mcc,
            "unit evaluated"
        );
        Ok(FoldResult {
            combination,
            repeat: data.repeat,
            fold: data.fold,
            metrics: self.metrics.iter().map(|&k| (k, all.get(k))).collect(),
        })
    }
}

/// Reduce sorted fold results to one row per grid combination.
fn summarize(
    results: &[(usize, FoldResult)],
    grid: &HyperparameterGrid,
    metrics: &[MetricKind],
) -> Vec<SummaryRow> {
    grid.combinations()
        .iter()
        .enumerate()
        .map(|(c, &combination)| {
            let folds: Vec<&FoldResult> = results
                .iter()
                .filter(|(i, _)| *i == c)
                .map(|(_, r)| r)
                .collect();
            let summaries = metrics
                .iter()
                .map(|&kind| {
                    let values = folds
                        .iter()
                        .map(|r| r.metrics.get(&kind).copied().unwrap_or(f64::NAN));
                    (kind, MetricSummary::from_values(values))
                })
                .collect();
            SummaryRow {
                combination,
                n_folds: folds.len(),
                metrics: summaries,
            }
        })
        .collect()
}

/// Pick the row with the best mean `metric`.
///
/// Lower-is-better metrics are negated, an undefined mean ranks last, and
/// ties go to the smallest combination.
pub(crate) fn select_best(rows: &[SummaryRow], metric: MetricKind) -> Option<HyperparameterCombination> {
    let score = |row: &SummaryRow| {
        let mean = row.mean(metric);
        if mean.is_nan() {
            f64::NEG_INFINITY
        } else if metric.higher_is_better() {
            mean
        } else {
            -mean
        }
    };
    let mut best: Option<(f64, HyperparameterCombination)> = None;
    for row in rows {
        let s = score(row);
        let better = best.is_none_or(|(bs, bc)| s > bs || (s == bs && row.combination < bc));
        if better {
            best = Some((s, row.combination));
        }
    }
    best.map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ClassPair, Schema};
    use crate::trainer::RandomForestTrainer;

    // ---------------------------------------------------------------
    // Stub collaborator
    // ---------------------------------------------------------------

    /// Predicts from the sign of feature 0 when `signal`, else a coin flip.
    struct StubModel {
        signal: bool,
    }

    impl Ensemble for StubModel {
        fn predict_proba_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, BoxError> {
            Ok(rows
                .iter()
                .map(|r| match (self.signal, r[0] > 0.0) {
                    (true, true) => 0.9,
                    (true, false) => 0.1,
                    (false, _) => 0.5,
                })
                .collect())
        }

        fn feature_importances(&self) -> Vec<f64> {
            vec![1.0, 0.0]
        }

        fn n_trees(&self) -> usize {
            1
        }
    }

    #[derive(Default)]
    struct StubTrainer {
        good: Vec<HyperparameterCombination>,
        fail_on: Option<HyperparameterCombination>,
    }

    impl ForestTrainer for StubTrainer {
        type Model = StubModel;

        fn train(&self, request: &TrainRequest<'_>) -> Result<StubModel, BoxError> {
            if self.fail_on == Some(request.combination) {
                return Err("stub failure".into());
            }
            Ok(StubModel {
                signal: self.good.contains(&request.combination),
            })
        }
    }

    // ---------------------------------------------------------------
    // Fixtures
    // ---------------------------------------------------------------

    /// 30 rows, 10 positives; feature 0 separates the classes.
    fn matrix() -> LabeledMatrix {
        let labels: Vec<usize> = (0..30).map(|i| usize::from(i % 3 == 0)).collect();
        let rows = labels
            .iter()
            .enumerate()
            .map(|(i, &l)| vec![l as f64 * 10.0 + (i % 5) as f64 * 0.1, ((i * 7) % 13) as f64])
            .collect();
        LabeledMatrix::new(
            (0..30).map(|i| format!("r{i}")).collect(),
            rows,
            labels,
            Schema::new(vec!["signal".into(), "noise".into()]),
            ClassPair::new("neg", "pos"),
        )
        .unwrap()
    }

    fn combo(mtry: usize, min_n: usize) -> HyperparameterCombination {
        HyperparameterCombination::new(mtry, min_n)
    }

    fn grid() -> HyperparameterGrid {
        HyperparameterGrid::from_combinations(vec![combo(1, 2), combo(1, 6), combo(2, 2)]).unwrap()
    }

    // ---------------------------------------------------------------
    // Tuning runs
    // ---------------------------------------------------------------

    #[test]
    fn one_row_per_combination_with_all_folds() {
        let tuner = CrossValidatedTuner::new(5, 2).unwrap().with_n_trees(1);
        let summary = tuner
            .tune(&StubTrainer::default(), &matrix(), &grid(), &CancelToken::new())
            .unwrap();
        assert_eq!(summary.rows().len(), 3);
        for row in summary.rows() {
            assert_eq!(row.n_folds, 10);
            assert_eq!(row.metrics.len(), MetricKind::ALL.len());
        }
        assert_eq!(summary.fold_results().len(), 30);
    }

    #[test]
    fn best_combination_selected_with_simplest_tie_break() {
        let trainer = StubTrainer {
            good: vec![combo(2, 2), combo(1, 6)],
            fail_on: None,
        };
        let summary = CrossValidatedTuner::new(5, 1)
            .unwrap()
            .tune(&trainer, &matrix(), &grid(), &CancelToken::new())
            .unwrap();
        assert_eq!(summary.best(), combo(1, 6));
        let best = summary.best_row().unwrap();
        assert!((best.mean(MetricKind::Mcc) - 1.0).abs() < 1e-12);
        assert_eq!(summary.row(combo(1, 2)).unwrap().mean(MetricKind::Mcc), 0.0);
    }

    #[test]
    fn failing_unit_fails_the_run() {
        let trainer = StubTrainer {
            good: Vec::new(),
            fail_on: Some(combo(2, 2)),
        };
        let err = CrossValidatedTuner::new(3, 1)
            .unwrap()
            .tune(&trainer, &matrix(), &grid(), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, TuneError::Trainer { combination, .. } if combination == combo(2, 2)));
    }

    #[test]
    fn cancelled_run_returns_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = CrossValidatedTuner::new(3, 1)
            .unwrap()
            .tune(&StubTrainer::default(), &matrix(), &grid(), &cancel)
            .unwrap_err();
        assert!(matches!(err, TuneError::Cancelled));
    }

    #[test]
    fn every_fold_scores_every_combination_once() {
        let tuner = CrossValidatedTuner::new(3, 2).unwrap().with_workers(3);
        let summary = tuner
            .tune(&StubTrainer::default(), &matrix(), &grid(), &CancelToken::new())
            .unwrap();
        let coords: Vec<(HyperparameterCombination, usize, usize)> = summary
            .fold_results()
            .iter()
            .map(|r| (r.combination, r.repeat, r.fold))
            .collect();
        let expected: Vec<(HyperparameterCombination, usize, usize)> = grid()
            .combinations()
            .iter()
            .flat_map(|&c| (0..2).flat_map(move |r| (0..3).map(move |f| (c, r, f))))
            .collect();
        assert_eq!(coords, expected);
    }

    #[test]
    fn identical_across_worker_counts() {
        let tuner = CrossValidatedTuner::new(3, 2).unwrap().with_n_trees(7).with_seed(11);
        let trainer = RandomForestTrainer::new();
        let one = tuner
            .clone()
            .with_workers(1)
            .tune(&trainer, &matrix(), &grid(), &CancelToken::new())
            .unwrap();
        let four = tuner
            .with_workers(4)
            .tune(&trainer, &matrix(), &grid(), &CancelToken::new())
            .unwrap();
        // Debug output compares NaN sentinels as equal.
        assert_eq!(format!("{one:?}"), format!("{four:?}"));
    }

    #[test]
    fn precondition_errors() {
        assert!(matches!(
            CrossValidatedTuner::new(1, 1),
            Err(TuneError::InvalidFoldCount { n_folds: 1 })
        ));
        assert!(matches!(
            CrossValidatedTuner::new(3, 0),
            Err(TuneError::InvalidRepeatCount { n_repeats: 0 })
        ));

        let too_many_folds = CrossValidatedTuner::new(11, 1).unwrap();
        assert!(matches!(
            too_many_folds.tune(&StubTrainer::default(), &matrix(), &grid(), &CancelToken::new()),
            Err(TuneError::InsufficientFoldSize { count: 10, n_folds: 11, .. })
        ));

        let narrow = CrossValidatedTuner::new(3, 1)
            .unwrap()
            .with_metrics(vec![MetricKind::Accuracy]);
        assert!(matches!(
            narrow.tune(&StubTrainer::default(), &matrix(), &grid(), &CancelToken::new()),
            Err(TuneError::SelectionMetricNotInSet { metric: MetricKind::Mcc })
        ));
    }

    // ---------------------------------------------------------------
    // Reduction and selection
    // ---------------------------------------------------------------

    fn row(c: HyperparameterCombination, kind: MetricKind, mean: f64) -> SummaryRow {
        SummaryRow {
            combination: c,
            n_folds: 1,
            metrics: BTreeMap::from([(kind, MetricSummary { mean, std_err: f64::NAN, n: 1 })]),
        }
    }

    #[test]
    fn lower_brier_wins_and_nan_ranks_last() {
        let rows = vec![
            row(combo(1, 2), MetricKind::Brier, f64::NAN),
            row(combo(2, 2), MetricKind::Brier, 0.20),
            row(combo(3, 2), MetricKind::Brier, 0.10),
        ];
        assert_eq!(select_best(&rows, MetricKind::Brier), Some(combo(3, 2)));

        let all_nan = vec![
            row(combo(4, 2), MetricKind::Mcc, f64::NAN),
            row(combo(2, 6), MetricKind::Mcc, f64::NAN),
        ];
        assert_eq!(select_best(&all_nan, MetricKind::Mcc), Some(combo(2, 6)));
        assert_eq!(select_best(&[], MetricKind::Mcc), None);
    }

    #[test]
    fn summary_statistics() {
        let s = MetricSummary::from_values([1.0, 2.0, 3.0, f64::NAN]);
        assert_eq!(s.n, 3);
        assert!((s.mean - 2.0).abs() < 1e-12);
        assert!((s.std_err - 1.0 / 3f64.sqrt()).abs() < 1e-12);

        let single = MetricSummary::from_values([0.5]);
        assert_eq!(single.mean, 0.5);
        assert!(single.std_err.is_nan());
    }
}

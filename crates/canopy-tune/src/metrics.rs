//! Binary classification metrics.
//!
//! Every metric is a pure function of (truth, prediction, probability)
//! triples. Conditions that leave a metric undefined, such as a class absent
//! from the truth labels, yield `NaN`; only malformed input is an error.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::dataset::POSITIVE;
use crate::error::TuneError;

/// A metric the evaluator can report and the tuner can select on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Fraction of correct predictions.
    Accuracy,
    /// True positive rate.
    Sensitivity,
    /// True negative rate.
    Specificity,
    /// Matthews correlation coefficient.
    Mcc,
    /// Area under the ROC curve of the positive-class probability.
    RocAuc,
    /// Mean squared error of the positive-class probability.
    Brier,
}

impl MetricKind {
    /// Every supported metric, in reporting order.
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Accuracy,
        MetricKind::Sensitivity,
        MetricKind::Specificity,
        MetricKind::Mcc,
        MetricKind::RocAuc,
        MetricKind::Brier,
    ];

    /// Return `true` when larger values are better.
    #[must_use]
    pub fn higher_is_better(self) -> bool {
        !matches!(self, MetricKind::Brier)
    }

    /// Return the snake-case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Accuracy => "accuracy",
            MetricKind::Sensitivity => "sensitivity",
            MetricKind::Specificity => "specificity",
            MetricKind::Mcc => "mcc",
            MetricKind::RocAuc => "roc_auc",
            MetricKind::Brier => "brier",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = TuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or_else(|| TuneError::UnknownMetric {
                name: s.to_string(),
            })
    }
}

/// A 2x2 confusion matrix with the positive class at label index 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    /// Positives predicted positive.
    pub tp: usize,
    /// Positives predicted negative.
    #[serde(rename = "fn")]
    pub fn_: usize,
    /// Negatives predicted negative.
    pub tn: usize,
    /// Negatives predicted positive.
    pub fp: usize,
}

impl ConfusionMatrix {
    /// Count outcomes from paired label indices.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::EmptyInput`] | Zero labels |
    /// | [`TuneError::LengthMismatch`] | `predicted.len() != truth.len()` |
    /// | [`TuneError::InvalidLabel`] | A label is neither 0 nor 1 |
    pub fn from_labels(truth: &[usize], predicted: &[usize]) -> Result<Self, TuneError> {
        if truth.is_empty() {
            return Err(TuneError::EmptyInput);
        }
        if predicted.len() != truth.len() {
            return Err(TuneError::LengthMismatch {
                expected: truth.len(),
                got: predicted.len(),
            });
        }
        let mut cm = Self::default();
        for (index, (&t, &p)) in truth.iter().zip(predicted).enumerate() {
            match (t, p) {
                (1, 1) => cm.tp += 1,
                (1, 0) => cm.fn_ += 1,
                (0, 0) => cm.tn += 1,
                (0, 1) => cm.fp += 1,
                _ => {
                    return Err(TuneError::InvalidLabel {
                        index,
                        label: t.max(p),
                    });
                }
            }
        }
        Ok(cm)
    }

    /// Return the number of records counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.tp + self.fn_ + self.tn + self.fp
    }

    /// `(TP + TN) / N`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        (self.tp + self.tn) as f64 / self.total() as f64
    }

    /// `TP / (TP + FN)`; `NaN` with no positives.
    #[must_use]
    pub fn sensitivity(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// `TN / (TN + FP)`; `NaN` with no negatives.
    #[must_use]
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    /// Matthews correlation coefficient; `0.0` when any marginal is empty.
    #[must_use]
    pub fn mcc(&self) -> f64 {
        let (tp, fn_, tn, fp) = (
            self.tp as f64,
            self.fn_ as f64,
            self.tn as f64,
            self.fp as f64,
        );
        let denom = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        if denom == 0.0 {
            0.0
        } else {
            (tp * tn - fp * fn_) / denom
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>10} {:>8} {:>8}", "", "pred_neg", "pred_pos")?;
        writeln!(f, "{:>10} {:>8} {:>8}", "true_neg", self.tn, self.fp)?;
        writeln!(f, "{:>10} {:>8} {:>8}", "true_pos", self.fn_, self.tp)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { f64::NAN } else { num as f64 / den as f64 }
}

/// All metrics for one partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationMetrics {
    /// The underlying counts.
    pub confusion: ConfusionMatrix,
    /// See [`ConfusionMatrix::accuracy`].
    pub accuracy: f64,
    /// See [`ConfusionMatrix::sensitivity`].
    pub sensitivity: f64,
    /// See [`ConfusionMatrix::specificity`].
    pub specificity: f64,
    /// See [`ConfusionMatrix::mcc`].
    pub mcc: f64,
    /// See [`roc_auc`]; `NaN` when no probabilities were supplied.
    pub roc_auc: f64,
    /// See [`brier_score`]; `NaN` when no probabilities were supplied.
    pub brier: f64,
}

impl ClassificationMetrics {
    /// Return the value of one metric.
    #[must_use]
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Accuracy => self.accuracy,
            MetricKind::Sensitivity => self.sensitivity,
            MetricKind::Specificity => self.specificity,
            MetricKind::Mcc => self.mcc,
            MetricKind::RocAuc => self.roc_auc,
            MetricKind::Brier => self.brier,
        }
    }
}

/// Compute every metric for one partition.
///
/// `probabilities`, when given, are positive-class probabilities aligned with
/// `truth`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TuneError::EmptyInput`] | Zero records |
/// | [`TuneError::LengthMismatch`] | An input's length differs from `truth` |
/// | [`TuneError::InvalidLabel`] | A label is neither 0 nor 1 |
pub fn evaluate(
    truth: &[usize],
    predicted: &[usize],
    probabilities: Option<&[f64]>,
) -> Result<ClassificationMetrics, TuneError> {
    let confusion = ConfusionMatrix::from_labels(truth, predicted)?;
    let (roc_auc, brier) = match probabilities {
        Some(p) => (roc_auc(truth, p)?, brier_score(truth, p)?),
        None => (f64::NAN, f64::NAN),
    };
    Ok(ClassificationMetrics {
        confusion,
        accuracy: confusion.accuracy(),
        sensitivity: confusion.sensitivity(),
        specificity: confusion.specificity(),
        mcc: confusion.mcc(),
        roc_auc,
        brier,
    })
}

fn check_probabilities(truth: &[usize], probabilities: &[f64]) -> Result<(), TuneError> {
    if truth.is_empty() {
        return Err(TuneError::EmptyInput);
    }
    if probabilities.len() != truth.len() {
        return Err(TuneError::LengthMismatch {
            expected: truth.len(),
            got: probabilities.len(),
        });
    }
    Ok(())
}

/// Area under the ROC curve via the rank-sum statistic, averaging tied ranks.
///
/// Returns `NaN` when either class is absent from `truth`.
///
/// # Errors
///
/// Returns [`TuneError::EmptyInput`] or [`TuneError::LengthMismatch`].
pub fn roc_auc(truth: &[usize], probabilities: &[f64]) -> Result<f64, TuneError> {
    check_probabilities(truth, probabilities)?;
    let n_pos = truth.iter().filter(|&&t| t == POSITIVE).count();
    let n_neg = truth.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Ok(f64::NAN);
    }

    let mut order: Vec<usize> = (0..truth.len()).collect();
    order.sort_by(|&a, &b| probabilities[a].total_cmp(&probabilities[b]));

    let mut pos_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && probabilities[order[end]] == probabilities[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; the tied block start..end shares their mean.
        let mean_rank = (start + end + 1) as f64 / 2.0;
        let n_pos_block = order[start..end]
            .iter()
            .filter(|&&i| truth[i] == POSITIVE)
            .count();
        pos_rank_sum += mean_rank * n_pos_block as f64;
        start = end;
    }

    let u = pos_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Ok(u / (n_pos * n_neg) as f64)
}

/// Mean squared difference between positive-class probability and outcome.
///
/// # Errors
///
/// Returns [`TuneError::EmptyInput`] or [`TuneError::LengthMismatch`].
pub fn brier_score(truth: &[usize], probabilities: &[f64]) -> Result<f64, TuneError> {
    check_probabilities(truth, probabilities)?;
    let sum: f64 = truth
        .iter()
        .zip(probabilities)
        .map(|(&t, &p)| {
            let y = if t == POSITIVE { 1.0 } else { 0.0 };
            (p - y) * (p - y)
        })
        .sum();
    Ok(sum / truth.len() as f64)
}

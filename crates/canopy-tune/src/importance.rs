//! Ranking of per-feature importances from the final ensemble.

use serde::Serialize;

use crate::error::TuneError;
use crate::model::TrainedModel;
use crate::trainer::Ensemble;

/// A ranked feature with name, importance score, and rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Normalized importance score (sums to 1.0 across all features).
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// The top features of one model, most important first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceReport {
    features: Vec<RankedFeature>,
    n_features: usize,
}

impl ImportanceReport {
    /// Return the ranked features.
    #[must_use]
    pub fn features(&self) -> &[RankedFeature] {
        &self.features
    }

    /// Return how many features were ranked before truncation.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// Sorts ensemble importances and keeps the top N.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportanceRanker {
    top_n: usize,
}

impl Default for ImportanceRanker {
    fn default() -> Self {
        Self { top_n: 16 }
    }
}

impl ImportanceRanker {
    /// Create a ranker reporting at most `top_n` features.
    ///
    /// # Errors
    ///
    /// Returns [`TuneError::InvalidTopN`] if `top_n` is zero.
    pub fn new(top_n: usize) -> Result<Self, TuneError> {
        if top_n == 0 {
            return Err(TuneError::InvalidTopN { top_n });
        }
        Ok(Self { top_n })
    }

    /// Return the report length limit.
    #[must_use]
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Rank the final model's features.
    ///
    /// # Errors
    ///
    /// Returns [`TuneError::LengthMismatch`] if the ensemble reports a
    /// different number of importances than it has features.
    pub fn rank<M: Ensemble>(&self, model: &TrainedModel<M>) -> Result<ImportanceReport, TuneError> {
        self.rank_scores(model.feature_names(), &model.ensemble().feature_importances())
    }

    /// Normalize `scores` to sum to 1.0, sort descending, and truncate.
    ///
    /// The sort is stable, so equal scores keep their column order.
    ///
    /// # Errors
    ///
    /// Returns [`TuneError::LengthMismatch`] if `scores` and `names` differ in length.
    pub fn rank_scores(&self, names: &[String], scores: &[f64]) -> Result<ImportanceReport, TuneError> {
        if scores.len() != names.len() {
            return Err(TuneError::LengthMismatch {
                expected: names.len(),
                got: scores.len(),
            });
        }
        let sum: f64 = scores.iter().filter(|s| s.is_finite()).sum();
        let mut features: Vec<RankedFeature> = names
            .iter()
            .zip(scores)
            .map(|(name, &score)| RankedFeature {
                name: name.clone(),
                importance: if sum > 0.0 { score / sum } else { score },
                rank: 0, // set after sorting
            })
            .collect();

        features.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        features.truncate(self.top_n);
        for (i, feat) in features.iter_mut().enumerate() {
            feat.rank = i + 1;
        }

        Ok(ImportanceReport {
            features,
            n_features: names.len(),
        })
    }
}

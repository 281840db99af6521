//! Leakage-safe preprocessing: correlation filter, zero-variance filter,
//! minority upsampling, and standardization.
//!
//! [`Preprocessor::fit`] learns every parameter from one training matrix and
//! returns a [`FittedPreprocessor`] that applies the same column drops and
//! scaling to any matrix with the fit-time schema. Upsampling only ever
//! touches the fitting matrix.

mod correlation;
mod resample;
mod standardize;
mod variance;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::dataset::{LabeledMatrix, Schema};
use crate::error::TuneError;

use standardize::Standardizer;

/// Unfitted preprocessing settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessor {
    correlation_threshold: f64,
    resample_ratio: f64,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            correlation_threshold: 0.99,
            resample_ratio: 1.0,
        }
    }
}

impl Preprocessor {
    /// Create preprocessing settings.
    ///
    /// `resample_ratio` is the target minority/majority count ratio after
    /// upsampling.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::InvalidCorrelationThreshold`] | `correlation_threshold` outside `[0, 1]` |
    /// | [`TuneError::InvalidResampleRatio`] | `resample_ratio` outside `(0, 1]` |
    pub fn new(correlation_threshold: f64, resample_ratio: f64) -> Result<Self, TuneError> {
        if !(0.0..=1.0).contains(&correlation_threshold) {
            return Err(TuneError::InvalidCorrelationThreshold {
                threshold: correlation_threshold,
            });
        }
        if !(resample_ratio > 0.0 && resample_ratio <= 1.0) {
            return Err(TuneError::InvalidResampleRatio {
                ratio: resample_ratio,
            });
        }
        Ok(Self {
            correlation_threshold,
            resample_ratio,
        })
    }

    /// Return the absolute-correlation threshold above which a pair is filtered.
    #[must_use]
    pub fn correlation_threshold(&self) -> f64 {
        self.correlation_threshold
    }

    /// Return the target minority/majority ratio.
    #[must_use]
    pub fn resample_ratio(&self) -> f64 {
        self.resample_ratio
    }

    /// Learn parameters from `train` and return them with the transformed,
    /// upsampled training matrix.
    ///
    /// `seed` drives the minority draws only.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::NoFeaturesRetained`] | Both filters together drop every column |
    /// | [`TuneError::DegenerateFeature`] | A retained column has zero standard deviation |
    #[instrument(skip_all, fields(n_rows = train.n_rows(), n_features = train.n_features()))]
    pub fn fit(
        &self,
        train: &LabeledMatrix,
        seed: u64,
    ) -> Result<(FittedPreprocessor, LabeledMatrix), TuneError> {
        let n_input = train.n_features();
        let columns: Vec<Vec<f64>> = (0..n_input).map(|f| train.column(f)).collect();

        let correlated = correlation::correlated_columns(&columns, self.correlation_threshold);
        let candidates: Vec<usize> = (0..n_input).filter(|c| !correlated.contains(c)).collect();
        let zero_variance = variance::zero_variance_columns(&columns, &candidates);
        let kept: Vec<usize> = candidates
            .into_iter()
            .filter(|c| !zero_variance.contains(c))
            .collect();
        if kept.is_empty() {
            return Err(TuneError::NoFeaturesRetained { n_input });
        }

        let order = resample::upsample_indices(train.labels(), self.resample_ratio, seed);
        debug!(
            n_added = order.len() - train.n_rows(),
            "minority rows upsampled"
        );

        let input_schema = train.schema().clone();
        let output_schema = input_schema.select(&kept);
        let kept_columns: Vec<Vec<f64>> = kept
            .iter()
            .map(|&c| order.iter().map(|&i| columns[c][i]).collect())
            .collect();
        let standardizer = Standardizer::fit(&kept_columns, output_schema.feature_names())?;

        let names = input_schema.feature_names();
        let fitted = FittedPreprocessor {
            dropped_correlated: correlated.iter().map(|&c| names[c].clone()).collect(),
            dropped_zero_variance: zero_variance.iter().map(|&c| names[c].clone()).collect(),
            input_schema,
            output_schema,
            kept,
            standardizer,
            resample_ratio: self.resample_ratio,
        };
        info!(
            n_dropped_correlated = fitted.dropped_correlated.len(),
            n_dropped_zero_variance = fitted.dropped_zero_variance.len(),
            n_retained = fitted.kept.len(),
            n_rows = order.len(),
            "preprocessor fitted"
        );

        let upsampled = train.select(&order);
        let transformed = fitted.apply(&upsampled);
        Ok((fitted, transformed))
    }
}

/// Preprocessing parameters learned from one training matrix.
///
/// Immutable; safe to share across threads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedPreprocessor {
    input_schema: Schema,
    output_schema: Schema,
    dropped_correlated: Vec<String>,
    dropped_zero_variance: Vec<String>,
    #[serde(skip)]
    kept: Vec<usize>,
    #[serde(flatten)]
    standardizer: Standardizer,
    resample_ratio: f64,
}

impl FittedPreprocessor {
    /// Apply the fitted drops and scaling to `matrix`. Never resamples.
    ///
    /// # Errors
    ///
    /// Returns [`TuneError::SchemaMismatch`] when `matrix`'s feature names
    /// differ from the fit-time schema.
    pub fn transform(&self, matrix: &LabeledMatrix) -> Result<LabeledMatrix, TuneError> {
        if matrix.schema() != &self.input_schema {
            return Err(TuneError::SchemaMismatch {
                expected: self.input_schema.feature_names().to_vec(),
                found: matrix.schema().feature_names().to_vec(),
            });
        }
        Ok(self.apply(matrix))
    }

    fn apply(&self, matrix: &LabeledMatrix) -> LabeledMatrix {
        let rows = matrix
            .rows()
            .iter()
            .map(|row| {
                let selected: Vec<f64> = self.kept.iter().map(|&c| row[c]).collect();
                self.standardizer.apply(&selected)
            })
            .collect();
        LabeledMatrix::from_parts(
            matrix.ids().to_vec(),
            rows,
            matrix.labels().to_vec(),
            self.output_schema.clone(),
            matrix.classes().clone(),
        )
    }

    /// Return the schema the preprocessor was fitted on.
    #[must_use]
    pub fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    /// Return the schema of transformed output.
    #[must_use]
    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    /// Return features dropped by the correlation filter, in input order.
    #[must_use]
    pub fn dropped_correlated(&self) -> &[String] {
        &self.dropped_correlated
    }

    /// Return features dropped for zero variance, in input order.
    #[must_use]
    pub fn dropped_zero_variance(&self) -> &[String] {
        &self.dropped_zero_variance
    }

    /// Return the per-feature means of the retained features.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.standardizer.means
    }

    /// Return the per-feature standard deviations of the retained features.
    #[must_use]
    pub fn stds(&self) -> &[f64] {
        &self.standardizer.stds
    }

    /// Return the minority/majority ratio targeted while fitting.
    #[must_use]
    pub fn resample_ratio(&self) -> f64 {
        self.resample_ratio
    }
}

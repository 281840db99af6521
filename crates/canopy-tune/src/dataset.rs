//! Immutable labeled datasets and the matrices derived from them.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::TuneError;

/// Label index of the negative class (first in sorted order).
pub const NEGATIVE: usize = 0;
/// Label index of the positive class (second in sorted order).
pub const POSITIVE: usize = 1;

/// The two outcome categories, ordered so the second one is positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassPair {
    negative: String,
    positive: String,
}

impl ClassPair {
    /// Order two distinct class names; the lexically greater one is positive.
    #[must_use]
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { negative: a, positive: b }
        } else {
            Self { negative: b, positive: a }
        }
    }

    /// Return the negative class name.
    #[must_use]
    pub fn negative(&self) -> &str {
        &self.negative
    }

    /// Return the positive class name.
    #[must_use]
    pub fn positive(&self) -> &str {
        &self.positive
    }

    /// Return the class name for a label index.
    #[must_use]
    pub fn name(&self, label: usize) -> &str {
        if label == POSITIVE { &self.positive } else { &self.negative }
    }

    /// Return the label index of a class name, if it is one of the pair.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if name == self.negative {
            Some(NEGATIVE)
        } else if name == self.positive {
            Some(POSITIVE)
        } else {
            None
        }
    }
}

/// Ordered feature-column names, resolved once when a dataset is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    feature_names: Vec<String>,
}

impl Schema {
    /// Create a schema from ordered feature names.
    #[must_use]
    pub fn new(feature_names: Vec<String>) -> Self {
        Self { feature_names }
    }

    /// Return the feature names in column order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Return a schema holding only the given column positions, in that order.
    pub(crate) fn select(&self, columns: &[usize]) -> Schema {
        Schema::new(columns.iter().map(|&c| self.feature_names[c].clone()).collect())
    }
}

/// A complete-case labeled dataset: identifiers, binary outcome, numeric features.
///
/// Immutable once built. Partitions are taken by index through
/// [`Dataset::select`], which copies into a [`LabeledMatrix`].
#[derive(Debug, Clone)]
pub struct Dataset {
    ids: Vec<String>,
    labels: Vec<usize>,
    classes: ClassPair,
    schema: Schema,
    features: Vec<Vec<f64>>,
}

impl Dataset {
    /// Build a dataset from raw outcome names, identifiers, and a feature matrix.
    ///
    /// `outcomes[i]`, `ids[i]`, and `features[i]` describe record `i`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::EmptyDataset`] | Zero records |
    /// | [`TuneError::NoFeatures`] | Zero feature names |
    /// | [`TuneError::LengthMismatch`] | `ids` or `features` length differs from `outcomes` |
    /// | [`TuneError::RaggedRow`] | A record's width differs from the schema |
    /// | [`TuneError::MissingValue`] | A value is NaN or infinite |
    /// | [`TuneError::NotBinary`] | Outcomes do not hold exactly two distinct values |
    pub fn new(
        outcomes: Vec<String>,
        ids: Vec<String>,
        feature_names: Vec<String>,
        features: Vec<Vec<f64>>,
    ) -> Result<Self, TuneError> {
        if outcomes.is_empty() {
            return Err(TuneError::EmptyDataset);
        }
        if feature_names.is_empty() {
            return Err(TuneError::NoFeatures);
        }
        for len in [ids.len(), features.len()] {
            if len != outcomes.len() {
                return Err(TuneError::LengthMismatch {
                    expected: outcomes.len(),
                    got: len,
                });
            }
        }
        validate_rows(&features, &feature_names)?;

        let distinct: Vec<&str> = outcomes
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let &[first, second] = distinct.as_slice() else {
            return Err(TuneError::NotBinary {
                n_classes: distinct.len(),
                classes: distinct.iter().map(|s| s.to_string()).collect(),
            });
        };
        let classes = ClassPair::new(first, second);
        let labels = outcomes
            .iter()
            .map(|o| usize::from(o.as_str() == classes.positive()))
            .collect();

        Ok(Self {
            ids,
            labels,
            classes,
            schema: Schema::new(feature_names),
            features,
        })
    }

    /// Return the record identifiers.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Return the label indices ([`NEGATIVE`] or [`POSITIVE`]).
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Return the outcome classes.
    #[must_use]
    pub fn classes(&self) -> &ClassPair {
        &self.classes
    }

    /// Return the feature schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the number of records.
    #[must_use]
    pub fn n_records(&self) -> usize {
        self.labels.len()
    }

    /// Return `[negative, positive]` record counts.
    #[must_use]
    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(&self.labels)
    }

    /// Copy the records at `indices` into a matrix, in the given order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> LabeledMatrix {
        LabeledMatrix {
            ids: indices.iter().map(|&i| self.ids[i].clone()).collect(),
            rows: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            schema: self.schema.clone(),
            classes: self.classes.clone(),
        }
    }
}

/// A labeled numeric matrix: one partition of a dataset or its transform.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    ids: Vec<String>,
    rows: Vec<Vec<f64>>,
    labels: Vec<usize>,
    schema: Schema,
    classes: ClassPair,
}

impl LabeledMatrix {
    /// Build a matrix from parts, validating shape, labels, and completeness.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::LengthMismatch`] | `ids` or `labels` length differs from `rows` |
    /// | [`TuneError::RaggedRow`] | A row's width differs from the schema |
    /// | [`TuneError::MissingValue`] | A value is NaN or infinite |
    /// | [`TuneError::InvalidLabel`] | A label is not 0 or 1 |
    pub fn new(
        ids: Vec<String>,
        rows: Vec<Vec<f64>>,
        labels: Vec<usize>,
        schema: Schema,
        classes: ClassPair,
    ) -> Result<Self, TuneError> {
        for len in [ids.len(), labels.len()] {
            if len != rows.len() {
                return Err(TuneError::LengthMismatch {
                    expected: rows.len(),
                    got: len,
                });
            }
        }
        validate_rows(&rows, schema.feature_names())?;
        if let Some(index) = labels.iter().position(|&l| l > POSITIVE) {
            return Err(TuneError::InvalidLabel {
                index,
                label: labels[index],
            });
        }
        Ok(Self {
            ids,
            rows,
            labels,
            schema,
            classes,
        })
    }

    /// Build a matrix whose invariants the caller already upholds.
    pub(crate) fn from_parts(
        ids: Vec<String>,
        rows: Vec<Vec<f64>>,
        labels: Vec<usize>,
        schema: Schema,
        classes: ClassPair,
    ) -> Self {
        debug_assert_eq!(ids.len(), rows.len());
        debug_assert_eq!(labels.len(), rows.len());
        Self {
            ids,
            rows,
            labels,
            schema,
            classes,
        }
    }

    /// Return the record identifiers.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Return the feature rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Return the label indices.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Return the feature schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Return the outcome classes.
    #[must_use]
    pub fn classes(&self) -> &ClassPair {
        &self.classes
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.schema.n_features()
    }

    /// Return `[negative, positive]` row counts.
    #[must_use]
    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(&self.labels)
    }

    /// Copy the rows at `indices` into a new matrix, in the given order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> LabeledMatrix {
        LabeledMatrix {
            ids: indices.iter().map(|&i| self.ids[i].clone()).collect(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            schema: self.schema.clone(),
            classes: self.classes.clone(),
        }
    }

    /// Extract column `feature` as a vector.
    pub(crate) fn column(&self, feature: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[feature]).collect()
    }
}

pub(crate) fn class_counts(labels: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &l in labels {
        counts[l] += 1;
    }
    counts
}

fn validate_rows(rows: &[Vec<f64>], feature_names: &[String]) -> Result<(), TuneError> {
    for (record_index, row) in rows.iter().enumerate() {
        if row.len() != feature_names.len() {
            return Err(TuneError::RaggedRow {
                record_index,
                expected: feature_names.len(),
                got: row.len(),
            });
        }
        if let Some(f) = row.iter().position(|v| !v.is_finite()) {
            return Err(TuneError::MissingValue {
                record_index,
                feature: feature_names[f].clone(),
            });
        }
    }
    Ok(())
}

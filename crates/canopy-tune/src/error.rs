use crate::grid::HyperparameterCombination;
use crate::trainer::BoxError;

/// Errors from splitting, preprocessing, tuning, and evaluation.
///
/// Precondition variants are returned before any computation starts.
/// Degenerate statistics (absent classes, zero denominators) are not errors;
/// they surface as `NaN` or `0.0` metric values instead.
#[derive(Debug, thiserror::Error)]
pub enum TuneError {
    /// Returned when the split proportion is not strictly inside (0, 1).
    #[error("split proportion must be in (0, 1), got {proportion}")]
    InvalidProportion {
        /// The invalid proportion.
        proportion: f64,
    },

    /// Returned when a class has fewer than 2 records and cannot be split.
    #[error("class \"{class}\" has {count} records, need at least 2 to split")]
    InsufficientData {
        /// Name of the under-populated class.
        class: String,
        /// Number of records of that class.
        count: usize,
    },

    /// Returned when a feature value is missing (NaN) or infinite.
    #[error("missing value in record {record_index}, feature \"{feature}\"")]
    MissingValue {
        /// Zero-based record index.
        record_index: usize,
        /// Name of the feature column.
        feature: String,
    },

    /// Returned when a matrix's feature columns differ from the fit-time schema.
    #[error("schema mismatch: expected features {expected:?}, found {found:?}")]
    SchemaMismatch {
        /// Feature names captured at fit time.
        expected: Vec<String>,
        /// Feature names of the matrix being transformed.
        found: Vec<String>,
    },

    /// Returned when a retained feature has zero or undefined standard deviation.
    #[error("feature \"{feature}\" has zero standard deviation and cannot be standardized")]
    DegenerateFeature {
        /// Name of the degenerate feature.
        feature: String,
    },

    /// Returned when preprocessing removes every feature column.
    #[error("preprocessing removed all {n_input} feature columns")]
    NoFeaturesRetained {
        /// Number of input feature columns.
        n_input: usize,
    },

    /// Returned when a hyperparameter grid has no combinations.
    #[error("hyperparameter grid is empty")]
    EmptyGrid,

    /// Returned when a class has too few records to appear in every fold.
    #[error("class \"{class}\" has {count} records, need at least {n_folds} for stratified folds")]
    InsufficientFoldSize {
        /// Name of the under-populated class.
        class: String,
        /// Number of records of that class in the training matrix.
        count: usize,
        /// The requested number of folds.
        n_folds: usize,
    },

    /// Returned when metrics are requested for zero records.
    #[error("cannot evaluate an empty prediction set")]
    EmptyInput,

    /// Returned when paired inputs have different lengths.
    #[error("length mismatch: expected {expected} entries, got {got}")]
    LengthMismatch {
        /// The expected length.
        expected: usize,
        /// The length found.
        got: usize,
    },

    /// Returned when a label index is neither 0 (negative) nor 1 (positive).
    #[error("label {label} at position {index} is not a binary class index")]
    InvalidLabel {
        /// Zero-based position of the label.
        index: usize,
        /// The label found.
        label: usize,
    },

    /// Returned when the outcome column does not hold exactly two classes.
    #[error("outcome must have exactly 2 classes, found {n_classes}: {classes:?}")]
    NotBinary {
        /// Number of distinct outcome values.
        n_classes: usize,
        /// The distinct outcome values, sorted.
        classes: Vec<String>,
    },

    /// Returned when a dataset has zero records.
    #[error("dataset has zero records")]
    EmptyDataset,

    /// Returned when a dataset has zero feature columns.
    #[error("dataset has zero feature columns")]
    NoFeatures,

    /// Returned when a record's feature vector length differs from the schema.
    #[error("record {record_index} has {got} features, schema has {expected}")]
    RaggedRow {
        /// Zero-based record index.
        record_index: usize,
        /// Number of features in the schema.
        expected: usize,
        /// Number of features in the record.
        got: usize,
    },

    /// Returned when the fold count is below 2.
    #[error("fold count must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid fold count.
        n_folds: usize,
    },

    /// Returned when the repeat count is zero.
    #[error("repeat count must be at least 1, got {n_repeats}")]
    InvalidRepeatCount {
        /// The invalid repeat count.
        n_repeats: usize,
    },

    /// Returned when the correlation threshold is outside [0, 1].
    #[error("correlation threshold must be in [0, 1], got {threshold}")]
    InvalidCorrelationThreshold {
        /// The invalid threshold.
        threshold: f64,
    },

    /// Returned when the resampling ratio is outside (0, 1].
    #[error("resample ratio must be in (0, 1], got {ratio}")]
    InvalidResampleRatio {
        /// The invalid ratio.
        ratio: f64,
    },

    /// Returned when a grid level count is zero.
    #[error("grid level counts must be positive, got ({features_per_split}, {min_leaf_size})")]
    InvalidGridLevels {
        /// Levels requested for features-per-split.
        features_per_split: usize,
        /// Levels requested for minimum-leaf-size.
        min_leaf_size: usize,
    },

    /// Returned when the tree count is zero.
    #[error("tree count must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid tree count.
        n_trees: usize,
    },

    /// Returned when the importance report length is zero.
    #[error("importance top-N must be at least 1, got {top_n}")]
    InvalidTopN {
        /// The invalid top-N.
        top_n: usize,
    },

    /// Returned when a metric name is not recognised.
    #[error("unknown metric \"{name}\" (expected accuracy, sensitivity, specificity, mcc, roc_auc, or brier)")]
    UnknownMetric {
        /// The unrecognised name.
        name: String,
    },

    /// Returned when the selection metric is not part of the evaluated metric set.
    #[error("selection metric {metric} is not in the evaluated metric set")]
    SelectionMetricNotInSet {
        /// The selection metric.
        metric: crate::metrics::MetricKind,
    },

    /// Returned when one tuning unit's training or prediction fails.
    #[error("training failed for {combination} on repeat {repeat}, fold {fold}")]
    Trainer {
        /// Zero-based repeat index.
        repeat: usize,
        /// Zero-based fold index.
        fold: usize,
        /// The combination being evaluated.
        combination: HyperparameterCombination,
        /// The collaborator's error.
        source: BoxError,
    },

    /// Returned when training or applying the final model fails.
    #[error("final model failed for {combination}")]
    FinalModel {
        /// The selected combination.
        combination: HyperparameterCombination,
        /// The collaborator's error.
        source: BoxError,
    },

    /// Returned when the bounded worker pool cannot be created.
    #[error("failed to build tuning worker pool")]
    WorkerPool {
        /// The underlying rayon error.
        source: rayon::ThreadPoolBuildError,
    },

    /// Returned when the run was cancelled before all units completed.
    #[error("tuning run cancelled")]
    Cancelled,
}

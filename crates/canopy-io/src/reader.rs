//! CSV dataset reader with full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use canopy_tune::Dataset;
use tracing::{debug, info, instrument};

use crate::IoError;

/// Cell spellings treated as a missing value.
const MISSING_MARKERS: [&str; 2] = ["NA", "NaN"];

/// Reads a labeled classification dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required: `outcome,id,feature1,...,featureN`
/// - Column 0 is the binary outcome label, column 1 the record identifier,
///   every later column a numeric feature
/// - One row per record, all rows with the same number of columns
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoFeatureColumns`] | Fewer than three header columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::MissingValue`] | Cell is empty, `NA`, or `NaN` |
/// | [`IoError::NonFiniteValue`] | Feature cell is infinite or unparseable |
/// | [`IoError::DuplicateRecordId`] | Same identifier appears twice |
/// | [`IoError::InvalidDataset`] | Outcome column does not hold exactly two classes |
pub struct DatasetReader {
    path: PathBuf,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so ragged rows reach the InconsistentRowLength check
        // instead of failing inside the parser.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.parse_error(e))?.clone();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");
        if expected_cols < 3 {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        let column_name = |i: usize| header.get(i).unwrap_or_default().to_string();
        let feature_names: Vec<String> = header.iter().skip(2).map(String::from).collect();

        let mut outcomes = Vec::new();
        let mut ids = Vec::new();
        let mut features = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.parse_error(e))?;
            let cell = |i: usize| record.get(i).unwrap_or_default();

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    record_id: cell(1).to_string(),
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            for col_index in [0, 1] {
                if is_missing(cell(col_index)) {
                    return Err(IoError::MissingValue {
                        path: self.path.clone(),
                        row_index,
                        column: column_name(col_index),
                    });
                }
            }

            let record_id = cell(1).to_string();
            if let Some(&first_row) = seen.get(&record_id) {
                return Err(IoError::DuplicateRecordId {
                    path: self.path.clone(),
                    record_id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(record_id.clone(), row_index);

            let mut row = Vec::with_capacity(feature_names.len());
            for col_index in 2..record.len() {
                let raw = cell(col_index);
                if is_missing(raw) {
                    return Err(IoError::MissingValue {
                        path: self.path.clone(),
                        row_index,
                        column: column_name(col_index),
                    });
                }
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        column: column_name(col_index),
                        raw: raw.to_string(),
                    })?;
                row.push(value);
            }

            outcomes.push(cell(0).to_string());
            ids.push(record_id);
            features.push(row);
        }

        if ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let n_records = ids.len();
        let dataset = Dataset::new(outcomes, ids, feature_names, features).map_err(|source| {
            IoError::InvalidDataset {
                path: self.path.clone(),
                source,
            }
        })?;
        info!(
            n_records,
            n_features = dataset.schema().n_features(),
            negative = dataset.classes().negative(),
            positive = dataset.classes().positive(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    fn parse_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || MISSING_MARKERS.iter().any(|m| raw.eq_ignore_ascii_case(m))
}

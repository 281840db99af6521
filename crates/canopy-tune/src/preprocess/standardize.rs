//! Per-feature centering and scaling.

use serde::Serialize;

use crate::error::TuneError;

/// Means and sample standard deviations captured from training columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Standardizer {
    pub(crate) means: Vec<f64>,
    pub(crate) stds: Vec<f64>,
}

impl Standardizer {
    /// Capture mean and sample standard deviation of each column.
    ///
    /// # Errors
    ///
    /// Returns [`TuneError::DegenerateFeature`] when a column's standard
    /// deviation is zero or undefined (fewer than two rows).
    pub(crate) fn fit(columns: &[Vec<f64>], names: &[String]) -> Result<Self, TuneError> {
        let mut means = Vec::with_capacity(columns.len());
        let mut stds = Vec::with_capacity(columns.len());
        for (column, name) in columns.iter().zip(names) {
            let n = column.len() as f64;
            let mean = column.iter().sum::<f64>() / n;
            let var = column.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
            let std = var.sqrt();
            if !(std.is_finite() && std > 0.0) {
                return Err(TuneError::DegenerateFeature {
                    feature: name.clone(),
                });
            }
            means.push(mean);
            stds.push(std);
        }
        Ok(Self { means, stds })
    }

    /// Standardize one row of retained features.
    pub(crate) fn apply(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(x, (mean, std))| (x - mean) / std)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_column_is_degenerate() {
        let err = Standardizer::fit(&[vec![2.0, 2.0, 2.0]], &["c".to_string()]).unwrap_err();
        assert!(matches!(err, TuneError::DegenerateFeature { ref feature } if feature == "c"));
    }

    #[test]
    fn single_row_is_degenerate() {
        assert!(Standardizer::fit(&[vec![2.0]], &["c".to_string()]).is_err());
    }

    #[test]
    fn apply_centers_and_scales() {
        let s = Standardizer::fit(&[vec![1.0, 3.0]], &["x".to_string()]).unwrap();
        assert_eq!(s.means, vec![2.0]);
        assert!((s.stds[0] - 2f64.sqrt()).abs() < 1e-12);
        assert!((s.apply(&[3.0])[0] - 1.0 / 2f64.sqrt()).abs() < 1e-12);
    }
}

//! JSON report writer for tuning and evaluation outputs.

use std::fs;
use std::path::{Path, PathBuf};

use canopy_tune::{
    ClassPair, ClassificationMetrics, FittedPreprocessor, HyperparameterCombination,
    HyperparameterGrid, ImportanceReport, PipelineReport, PredictionSet, TuningSummary,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::ExperimentName;
use crate::IoError;

/// Writes pipeline reports to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_tuning.json` and
/// `{experiment}_evaluation.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write the grid and cross-validated metrics to `{experiment}_tuning.json`.
    ///
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    #[instrument(skip_all)]
    pub fn write_tuning(
        &self,
        grid: &HyperparameterGrid,
        summary: &TuningSummary,
    ) -> Result<PathBuf, IoError> {
        let artifact = TuningArtifact {
            experiment: self.experiment.as_str(),
            grid_size: grid.len(),
            grid: grid.combinations(),
            summary,
        };
        let path = self.write_json("tuning", &artifact)?;
        info!(path = %path.display(), "tuning summary written");
        Ok(path)
    }

    /// Write the final model's held-out results to `{experiment}_evaluation.json`.
    ///
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    #[instrument(skip_all)]
    pub fn write_evaluation<M>(&self, report: &PipelineReport<M>) -> Result<PathBuf, IoError> {
        let artifact = EvaluationArtifact {
            experiment: self.experiment.as_str(),
            classes: report.predictions.classes(),
            selected: report.model.combination(),
            train_class_counts: report.train_class_counts,
            test_class_counts: report.test_class_counts,
            preprocessing: report.preprocessor(),
            metrics: &report.metrics,
            importance: &report.importance,
            predictions: &report.predictions,
        };
        let path = self.write_json("evaluation", &artifact)?;
        info!(path = %path.display(), "evaluation written");
        Ok(path)
    }

    /// Write both reports of one run.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    pub fn write_report<M>(&self, report: &PipelineReport<M>) -> Result<[PathBuf; 2], IoError> {
        Ok([
            self.write_tuning(&report.grid, &report.tuning)?,
            self.write_evaluation(report)?,
        ])
    }

    fn write_json(&self, kind: &str, artifact: &impl Serialize) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()));
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Serialization shadow structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct TuningArtifact<'a> {
    experiment: &'a str,
    grid_size: usize,
    grid: &'a [HyperparameterCombination],
    summary: &'a TuningSummary,
}

#[derive(Serialize)]
struct EvaluationArtifact<'a> {
    experiment: &'a str,
    classes: &'a ClassPair,
    selected: HyperparameterCombination,
    train_class_counts: [usize; 2],
    test_class_counts: [usize; 2],
    preprocessing: &'a FittedPreprocessor,
    metrics: &'a ClassificationMetrics,
    importance: &'a ImportanceReport,
    predictions: &'a PredictionSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let experiment = ExperimentName::new("exp".into()).unwrap();
        ResultWriter::new(&nested, experiment).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn output_dir_blocked_by_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let experiment = ExperimentName::new("exp".into()).unwrap();
        let err = ResultWriter::new(&blocker.join("sub"), experiment).err().unwrap();
        assert!(matches!(err, IoError::OutputDirCreate { .. }));
    }
}

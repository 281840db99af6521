//! End-to-end integration tests: CSV -> pipeline -> JSON -> deserialize.

use std::fmt::Write as _;
use std::fs;

use canopy_io::{DatasetReader, ExperimentName, ResultWriter};
use canopy_tune::{Pipeline, PipelineConfig, RandomForestTrainer};
use tempfile::TempDir;

/// 90 records, one "disease" per two "healthy"; `marker` separates them.
fn write_dataset(dir: &TempDir) -> std::path::PathBuf {
    let mut csv = String::from("diagnosis,patient,marker,age,marker_copy,site\n");
    for i in 0..90 {
        let disease = i % 3 == 0;
        let marker = if disease { 5.0 } else { 1.0 } + (i % 7) as f64 * 0.1;
        let age = 30 + (i * 13) % 40;
        let label = if disease { "disease" } else { "healthy" };
        writeln!(csv, "{label},P{i:03},{marker},{age},{marker},1").unwrap();
    }
    let path = dir.path().join("cohort.csv");
    fs::write(&path, csv).unwrap();
    path
}

#[test]
fn csv_to_reports_round_trip() {
    let dir = TempDir::new().unwrap();

    // 1. Read CSV
    let dataset = DatasetReader::new(&write_dataset(&dir)).read().unwrap();
    assert_eq!(dataset.n_records(), 90);
    assert_eq!(dataset.classes().positive(), "healthy");

    // 2. Run the pipeline
    let config = PipelineConfig::new()
        .with_n_folds(3)
        .with_n_trees(20)
        .with_grid_levels(2, 2)
        .with_top_n(2);
    let report = Pipeline::new(config, RandomForestTrainer::new())
        .unwrap()
        .run(&dataset)
        .unwrap();

    // 3. Write JSON artifacts
    let out = dir.path().join("reports");
    let writer = ResultWriter::new(&out, ExperimentName::new("cohort_rt".into()).unwrap()).unwrap();
    let [tuning_path, evaluation_path] = writer.write_report(&report).unwrap();
    assert_eq!(tuning_path, out.join("cohort_rt_tuning.json"));
    assert_eq!(evaluation_path, out.join("cohort_rt_evaluation.json"));

    // 4. Deserialize back and verify
    let tuning: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&tuning_path).unwrap()).unwrap();
    assert_eq!(tuning["experiment"], "cohort_rt");
    let rows = tuning["summary"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), tuning["grid_size"].as_u64().unwrap() as usize);
    assert_eq!(rows[0]["n_folds"], 3);
    assert!(rows[0]["metrics"]["mcc"]["mean"].is_number());
    assert_eq!(tuning["summary"]["selection_metric"], "mcc");

    let evaluation: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&evaluation_path).unwrap()).unwrap();
    assert_eq!(evaluation["classes"]["negative"], "disease");
    assert_eq!(
        evaluation["selected"]["features_per_split"],
        tuning["summary"]["best"]["features_per_split"]
    );
    assert_eq!(
        evaluation["preprocessing"]["dropped_correlated"],
        serde_json::json!(["marker_copy"])
    );
    assert_eq!(
        evaluation["preprocessing"]["dropped_zero_variance"],
        serde_json::json!(["site"])
    );
    assert_eq!(evaluation["importance"]["features"].as_array().unwrap().len(), 2);
    assert_eq!(evaluation["importance"]["features"][0]["name"], "marker");

    let predictions = evaluation["predictions"]["predictions"].as_array().unwrap();
    let n_test: u64 = report.test_class_counts.iter().map(|&c| c as u64).sum();
    assert_eq!(predictions.len() as u64, n_test);
    assert!(predictions[0]["id"].as_str().unwrap().starts_with('P'));

    // The simplest tied combination wins selection, so thresholded labels can
    // be soft; the ranking of held-out probabilities is what must be sharp.
    let roc_auc = evaluation["metrics"]["roc_auc"].as_f64().unwrap();
    assert!(roc_auc > 0.95, "roc_auc = {roc_auc}");

    let correct = predictions
        .iter()
        .filter(|p| p["truth"] == p["predicted"])
        .count();
    let accuracy = evaluation["metrics"]["accuracy"].as_f64().unwrap();
    assert!((accuracy - correct as f64 / predictions.len() as f64).abs() < 1e-12);
}

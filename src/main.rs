use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use canopy_forest::SplitCriterion;
use canopy_io::{DatasetReader, ExperimentName, ResultWriter};
use canopy_tune::{
    ClassificationMetrics, HyperparameterCombination, HyperparameterGrid, MetricKind, Pipeline,
    PipelineConfig, RandomForestTrainer, RankedFeature,
};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Leakage-safe random forest tuning and evaluation for binary outcomes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Pipeline parameters shared by every training run.
#[derive(Args, Debug, Clone)]
struct PipelineArgs {
    /// Fraction of each class placed in the training partition
    #[arg(long, default_value_t = 0.75)]
    split_proportion: f64,

    /// Cross-validation fold count
    #[arg(long, default_value_t = 10)]
    folds: usize,

    /// Number of times the fold assignment is redrawn
    #[arg(long, default_value_t = 1)]
    repeats: usize,

    /// Absolute correlation above which one feature of a pair is dropped
    #[arg(long, default_value_t = 0.99)]
    correlation_threshold: f64,

    /// Target minority/majority ratio after upsampling the training data
    #[arg(long, default_value_t = 1.0)]
    resample_ratio: f64,

    /// Trees per forest
    #[arg(long, default_value_t = 500)]
    trees: usize,

    /// Grid levels for features-per-split (mtry)
    #[arg(long, default_value_t = 5)]
    mtry_levels: usize,

    /// Grid levels for minimum node size (min_n)
    #[arg(long, default_value_t = 5)]
    min_n_levels: usize,

    /// Metric that selects the best combination
    #[arg(long, default_value = "mcc")]
    metric: String,

    /// Metrics computed on every fold (comma-separated, defaults to all)
    #[arg(long, value_delimiter = ',')]
    metrics: Vec<String>,

    /// Split criterion: "gini" or "entropy"
    #[arg(long, default_value = "gini")]
    criterion: String,

    /// Features kept in the importance report
    #[arg(long, default_value_t = 16)]
    top_n: usize,

    /// Threads dedicated to tuning (defaults to the global pool)
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Split, tune, refit, and evaluate a forest on a labeled CSV dataset
    Run {
        /// Path to the input CSV file (outcome, id, features...)
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Print the hyperparameter grid searched for a given feature count
    Grid {
        /// Number of features remaining after preprocessing
        #[arg(long)]
        n_features: usize,

        /// Grid levels for features-per-split (mtry)
        #[arg(long, default_value_t = 5)]
        mtry_levels: usize,

        /// Grid levels for minimum node size (min_n)
        #[arg(long, default_value_t = 5)]
        min_n_levels: usize,
    },
}

// ---------------------------------------------------------------------------
// JSON output types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RunOutput {
    experiment: String,
    n_records: usize,
    n_train: usize,
    n_test: usize,
    negative_class: String,
    positive_class: String,
    n_features_retained: usize,
    grid_size: usize,
    selection_metric: MetricKind,
    best: HyperparameterCombination,
    cv_mean: f64,
    cv_std_err: f64,
    test_metrics: ClassificationMetrics,
    top_features: Vec<RankedFeature>,
    reports: Vec<PathBuf>,
}

#[derive(Serialize)]
struct GridOutput {
    n_features: usize,
    grid_size: usize,
    combinations: Vec<HyperparameterCombination>,
}

fn parse_metric(s: &str) -> Result<MetricKind> {
    s.trim()
        .parse()
        .with_context(|| format!("invalid metric \"{s}\""))
}

fn parse_criterion(s: &str) -> Result<SplitCriterion> {
    match s {
        "gini" => Ok(SplitCriterion::Gini),
        "entropy" => Ok(SplitCriterion::Entropy),
        other => bail!("unknown split criterion \"{other}\" (expected gini or entropy)"),
    }
}

fn build_config(args: &PipelineArgs, seed: u64) -> Result<PipelineConfig> {
    let metrics = if args.metrics.is_empty() {
        MetricKind::ALL.to_vec()
    } else {
        args.metrics
            .iter()
            .map(|m| parse_metric(m))
            .collect::<Result<Vec<_>>>()?
    };
    let config = PipelineConfig::new()
        .with_split_proportion(args.split_proportion)
        .with_n_folds(args.folds)
        .with_n_repeats(args.repeats)
        .with_correlation_threshold(args.correlation_threshold)
        .with_resample_ratio(args.resample_ratio)
        .with_n_trees(args.trees)
        .with_grid_levels(args.mtry_levels, args.min_n_levels)
        .with_selection_metric(parse_metric(&args.metric)?)
        .with_metrics(metrics)
        .with_top_n(args.top_n)
        .with_seed(seed);
    let config = match args.workers {
        Some(workers) => config.with_workers(workers),
        None => config,
    };
    config.validate().context("invalid pipeline configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Run {
            data,
            experiment,
            output_dir,
            pipeline,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let config = build_config(&pipeline, cli.seed)?;
            let trainer =
                RandomForestTrainer::new().with_criterion(parse_criterion(&pipeline.criterion)?);

            let dataset = DatasetReader::new(&data)
                .read()
                .context("failed to read input CSV")?;

            let report = Pipeline::new(config, trainer)
                .context("invalid pipeline configuration")?
                .run(&dataset)
                .context("pipeline run failed")?;

            let writer = ResultWriter::new(&output_dir, experiment_name)
                .context("failed to prepare output directory")?;
            let reports = writer
                .write_report(&report)
                .context("failed to write reports")?;

            let selection_metric = report.tuning.selection_metric();
            let best_summary = report
                .tuning
                .best_row()
                .and_then(|row| row.metrics.get(&selection_metric).copied());
            let output = RunOutput {
                experiment,
                n_records: dataset.n_records(),
                n_train: report.split.train().len(),
                n_test: report.split.test().len(),
                negative_class: dataset.classes().negative().to_string(),
                positive_class: dataset.classes().positive().to_string(),
                n_features_retained: report.preprocessor().output_schema().n_features(),
                grid_size: report.grid.len(),
                selection_metric,
                best: report.tuning.best(),
                cv_mean: best_summary.map_or(f64::NAN, |s| s.mean),
                cv_std_err: best_summary.map_or(f64::NAN, |s| s.std_err),
                test_metrics: report.metrics,
                top_features: report.importance.features().to_vec(),
                reports: reports.to_vec(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Grid {
            n_features,
            mtry_levels,
            min_n_levels,
        } => {
            let grid = HyperparameterGrid::regular(n_features, (mtry_levels, min_n_levels))
                .context("invalid grid parameters")?;
            let output = GridOutput {
                n_features,
                grid_size: grid.len(),
                combinations: grid.combinations().to_vec(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

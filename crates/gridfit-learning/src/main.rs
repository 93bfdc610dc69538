//! CLI entry point for the regression experiment.

use anyhow::{Result, anyhow};
use clap::Parser;
use gridfit_learning::{Experiment, ExperimentConfig, ExperimentReport};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Outlier-filtered, grid-searched gradient boosting regression",
    long_about = "Loads X_train/y_train/X_test from a data directory, drops training outliers \
                  with Local Outlier Factor, cross-validates a grid of scale -> impute -> \
                  gradient boosting pipelines and writes predictions for the test table.\n\n\
                  EXAMPLES:\n  \
                  # Default run on ./raw, writes prediction.csv\n  \
                  gridfit\n\n  \
                  # Full training set, 3 folds on 4 threads\n  \
                  gridfit --no-debug-sample --cv-folds 3 --n-jobs 4\n\n  \
                  # Experiment described in JSON, report piped to jq\n  \
                  gridfit --config experiment.json --json | jq .best_score"
)]
struct Args {
    /// Directory holding sample.csv, X_train.csv, y_train.csv and X_test.csv
    /// [default: raw]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Prediction file [default: prediction.csv]
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON experiment configuration; other flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Train on every non-outlier row instead of a 1% sample
    #[arg(long)]
    no_debug_sample: bool,

    /// Seed for the debug sample and the fold shuffle [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Number of cross-validation folds [default: 5]
    #[arg(long)]
    cv_folds: Option<usize>,

    /// Parallel jobs for grid search, -1 for all cores [default: -1]
    #[arg(long, allow_hyphen_values = true)]
    n_jobs: Option<i32>,

    /// Neighbours used by Local Outlier Factor [default: 20]
    #[arg(long)]
    lof_neighbors: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a JSON report next to the prediction file
    ///
    /// The report will be saved as <output_stem>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    let output = config.output.clone();

    let experiment = Experiment::builder()
        .config(config)
        .on_progress(|update| match update.fits_completed {
            Some((done, total)) => debug!("[{}/{}] {}", done, total, update.message),
            None => info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage,
                update.message
            ),
        })
        .build()?;

    let report = match experiment.run() {
        Ok(report) => report,
        Err(e) => {
            error!("Experiment failed: {}", e);
            return Err(anyhow!("Experiment failed [{}]: {}", e.error_code(), e));
        }
    };

    if args.emit_report {
        let report_path = write_report(&report, &output)?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report);
    Ok(())
}

/// Start from the JSON config (or defaults) and apply every flag given.
fn build_config(args: &Args) -> Result<ExperimentConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            info!("Loading experiment configuration from {}", path.display());
            ExperimentConfig::from_json_file(path)?
        }
        None => ExperimentConfig::default(),
    };

    if let Some(ref dir) = args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(ref output) = args.output {
        config.output = output.clone();
    }
    if args.no_debug_sample {
        config.debug_sample = false;
    }
    if let Some(seed) = args.seed {
        config.random_seed = seed;
        config.search.random_seed = seed;
    }
    if let Some(folds) = args.cv_folds {
        config.search.cv_folds = folds;
    }
    if let Some(jobs) = args.n_jobs {
        config.search.n_jobs = jobs;
    }
    if let Some(k) = args.lof_neighbors {
        config.outlier.n_neighbors = k;
    }

    config.validate()?;
    Ok(config)
}

/// `<dir>/<output stem>_report.json`
fn report_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("prediction");
    output.with_file_name(format!("{}_report.json", stem))
}

/// Serialize `report` to the path given by [`report_path`].
fn write_report(report: &impl Serialize, output: &Path) -> Result<PathBuf> {
    let path = report_path(output);
    std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}

/// Print the run summary.
///
/// Uses `println!` intentionally: this is the primary output of the binary
/// and must be visible regardless of log level.
fn print_human_readable_summary(report: &ExperimentReport) {
    println!(
        "Data shape before outlier detection: {:?}",
        report.train_shape_before_outliers
    );
    println!(
        "Outliers removed: {} (threshold {:.4})",
        report.outliers.outliers_removed, report.outliers.threshold
    );
    if let Some(ref sampling) = report.sampling {
        println!(
            "Debug sample kept {} of {} rows",
            sampling.rows_after, sampling.rows_before
        );
    }
    println!("Training data shape: {:?}", report.training_shape);
    println!();

    println!("Best parameters set found on development set:");
    println!("R2 score: {:.3}", report.best_score);
    println!("{}", report.best_params);
    println!();

    println!("Grid scores on development set:");
    for candidate in &report.candidates {
        println!("{}", candidate.summary_line());
    }
    println!();

    println!(
        "Results saved as {} ({} rows in {:.1}s)",
        report.output_path.display(),
        report.n_predictions,
        report.elapsed_seconds
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_path_uses_output_stem() {
        assert_eq!(
            report_path(Path::new("out/prediction.csv")),
            PathBuf::from("out/prediction_report.json")
        );
        assert_eq!(
            report_path(Path::new("preds.csv")),
            PathBuf::from("preds_report.json")
        );
    }

    #[test]
    fn test_write_report_next_to_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("prediction.csv");
        let path = write_report(&serde_json::json!({ "best_score": 0.5 }), &output).unwrap();

        assert_eq!(path, dir.path().join("prediction_report.json"));
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["best_score"], 0.5);
    }

    #[test]
    fn test_json_and_emit_report_combine() {
        let args = Args::parse_from(["gridfit", "--json", "-r"]);
        assert!(args.json);
        assert!(args.emit_report);
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "gridfit",
            "--data-dir",
            "data",
            "--no-debug-sample",
            "--cv-folds",
            "3",
            "--n-jobs",
            "-1",
            "--lof-neighbors",
            "10",
            "--seed",
            "7",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(!config.debug_sample);
        assert_eq!(config.search.cv_folds, 3);
        assert_eq!(config.search.n_jobs, -1);
        assert_eq!(config.outlier.n_neighbors, 10);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.output, PathBuf::from("prediction.csv"));
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let args = Args::parse_from(["gridfit", "--cv-folds", "1"]);
        assert!(build_config(&args).is_err());
    }
}

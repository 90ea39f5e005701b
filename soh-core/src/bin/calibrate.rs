//! SOH Calibration - offline residual threshold
//!
//! Scores a reference dataset with the installed estimator bundle, then writes
//! the threshold table the server reads at startup, per-row results and the
//! ROC points of the synthetic-label self-check.
//!
//! Usage:
//!   soh-calibrate --data data/student_data.csv --models models --out results

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ev_soh_core::constants;
use ev_soh_core::logic::calibration::{run_calibration, CalibrationOutputs};
use ev_soh_core::{ModelBundle, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "soh-calibrate")]
#[command(about = "Compute the residual anomaly threshold from a reference dataset")]
struct Args {
    /// Reference CSV (battery_type,total_dist_km,charging_time_min,SOH_teacher)
    #[arg(long)]
    data: PathBuf,

    /// Model directory containing manifest.json (default: SOH_MODEL_DIR)
    #[arg(long)]
    models: Option<PathBuf>,

    /// Output directory (default: directory of SOH_METRICS_PATH)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Std multiplier; overrides the pipeline config
    #[arg(long)]
    k: Option<f64>,

    /// Pipeline config JSON (default: SOH_PIPELINE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("soh-calibrate v{}", constants::APP_VERSION);

    let config_path = args.config.or_else(constants::get_pipeline_config_path);
    let config = PipelineConfig::load_or_default(config_path.as_deref())
        .context("Failed to load pipeline config")?;

    let mut calibration = config.calibration.clone();
    if let Some(k) = args.k {
        calibration.k = k;
    }
    calibration
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid calibration settings: {}", e))?;

    let model_dir = args.models.unwrap_or_else(constants::get_model_dir);
    let bundle = ModelBundle::load_strict(&model_dir)
        .with_context(|| format!("Failed to load estimators from {}", model_dir.display()))?;

    let out_dir = match args.out {
        Some(dir) => dir,
        None => constants::get_metrics_path(&model_dir)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let outputs = CalibrationOutputs::in_dir(&out_dir);

    let report = run_calibration(&bundle, &args.data, &outputs, calibration)
        .with_context(|| format!("Calibration failed for {}", args.data.display()))?;

    log::info!(
        "Threshold (3SD) = {:.4} over {} rows (R2 {:.4}, RMSE {:.4}, MAE {:.4})",
        report.statistics.threshold,
        report.sample_count,
        report.fit.r2,
        report.fit.rmse,
        report.fit.mae
    );
    log::info!("Metrics: {}", outputs.metrics.display());
    log::info!("Results: {}", outputs.results.display());
    log::info!("ROC:     {}", outputs.roc.display());

    Ok(())
}

//! Calibration Module - Residual threshold & self-validation (offline)
//!
//! residual = |truth - prediction|, threshold = mean + k * std.
//!
//! There is no labelled anomaly set, so the run validates itself against a
//! synthetic label: rows whose reference value is above the 95th percentile.
//! The ROC/AUC answers "does a high residual predict an extreme reference
//! value". It is a diagnostic only; serving never reads it and uses its own
//! rule on fused degradation.

pub mod dataset;
pub mod roc;
pub mod stats;


use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{METRICS_FILE, RESULTS_FILE, ROC_FILE, THRESHOLD_METRIC};
use crate::error::{SohError, SohResult};
use crate::logic::model::threshold::{write_metrics_table, MetricRow};
use crate::logic::model::{ModelBundle, ReferenceResidualStatistics};

pub use dataset::{read_reference, score_reference, ReferenceRecord, ScoredRecord};
pub use roc::{auc, roc_curve, RocPoint};
pub use stats::FitMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Std multiplier
    pub k: f64,
    /// Reference quantile above which a row is a synthetic anomaly
    pub synthetic_label_quantile: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            k: 3.0,
            synthetic_label_quantile: 0.95,
        }
    }
}

impl CalibrationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.k.is_finite() || self.k < 0.0 {
            return Err(format!("calibration.k must be finite and >= 0, got {}", self.k));
        }
        if !(0.0..=1.0).contains(&self.synthetic_label_quantile) {
            return Err(format!(
                "calibration.synthetic_label_quantile must be in [0, 1], got {}",
                self.synthetic_label_quantile
            ));
        }
        Ok(())
    }
}

/// One (model prediction, reference truth) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSample {
    pub prediction: f64,
    pub truth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub statistics: ReferenceResidualStatistics,
    pub sample_count: usize,
    /// Per sample, input order
    pub residuals: Vec<f64>,
    pub detected: Vec<bool>,
    pub detected_anomalies: usize,
    /// P(quantile) of the reference values
    pub synthetic_cutoff: f64,
    pub synthetic_labels: Vec<bool>,
    pub synthetic_positives: usize,
    pub roc: Vec<RocPoint>,
    /// `None` when the synthetic label has one class
    pub auc: Option<f64>,
    pub fit: FitMetrics,
}

impl CalibrationReport {
    /// Rows of `anomaly_metrics.csv`. `ROC AUC` is left out when undefined.
    pub fn metric_rows(&self) -> Vec<MetricRow> {
        let mut rows = vec![
            MetricRow::new("Residual Mean", self.statistics.mean),
            MetricRow::new("Residual Std", self.statistics.std),
            MetricRow::new(THRESHOLD_METRIC, self.statistics.threshold),
            MetricRow::new("Detected Anomalies", self.detected_anomalies as f64),
        ];
        if let Some(auc) = self.auc {
            rows.push(MetricRow::new("ROC AUC", auc));
        }
        rows.push(MetricRow::new("R2", self.fit.r2));
        rows.push(MetricRow::new("RMSE", self.fit.rmse));
        rows.push(MetricRow::new("MAE", self.fit.mae));
        rows
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResidualCalibrator {
    config: CalibrationConfig,
}

impl ResidualCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    pub fn calibrate(&self, samples: &[ReferenceSample]) -> SohResult<CalibrationReport> {
        if samples.is_empty() {
            return Err(SohError::internal("calibration", "reference dataset is empty"));
        }
        if let Some(bad) = samples.iter().find(|s| !s.prediction.is_finite() || !s.truth.is_finite()) {
            return Err(SohError::internal("calibration", format!("non-finite sample {:?}", bad)));
        }

        let truths: Vec<f64> = samples.iter().map(|s| s.truth).collect();
        let predictions: Vec<f64> = samples.iter().map(|s| s.prediction).collect();
        let residuals: Vec<f64> = samples.iter().map(|s| (s.truth - s.prediction).abs()).collect();

        let statistics = ReferenceResidualStatistics::from_moments(
            stats::mean(&residuals),
            stats::sample_std(&residuals),
            self.config.k,
        );
        let detected: Vec<bool> = residuals.iter().map(|r| statistics.is_anomalous_residual(*r)).collect();
        let detected_anomalies = detected.iter().filter(|d| **d).count();

        let synthetic_cutoff = stats::quantile_linear(&truths, self.config.synthetic_label_quantile)
            .ok_or_else(|| SohError::internal("calibration", "no reference values"))?;
        let synthetic_labels: Vec<bool> = truths.iter().map(|t| *t > synthetic_cutoff).collect();
        let synthetic_positives = synthetic_labels.iter().filter(|l| **l).count();

        let roc = roc_curve(&synthetic_labels, &residuals);
        let auc = auc(&roc);

        let fit = FitMetrics::compute(&truths, &predictions)
            .ok_or_else(|| SohError::internal("calibration", "fit metrics undefined"))?;

        log::info!(
            "Residual mean={:.4} std={:.4} threshold(k={})={:.4}; detected {}/{}",
            statistics.mean,
            statistics.std,
            statistics.k,
            statistics.threshold,
            detected_anomalies,
            samples.len()
        );
        match auc {
            Some(v) => log::info!(
                "Synthetic label (> {:.2}): {} positives, ROC AUC {:.4}",
                synthetic_cutoff,
                synthetic_positives,
                v
            ),
            None => log::warn!("Synthetic label has a single class, ROC AUC undefined"),
        }

        Ok(CalibrationReport {
            statistics,
            sample_count: samples.len(),
            residuals,
            detected,
            detected_anomalies,
            synthetic_cutoff,
            synthetic_labels,
            synthetic_positives,
            roc,
            auc,
            fit,
        })
    }
}

// ============================================================================
// FILE-LEVEL RUN
// ============================================================================

/// Paths of the artifacts one run writes
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOutputs {
    pub metrics: PathBuf,
    pub results: PathBuf,
    pub roc: PathBuf,
}

impl CalibrationOutputs {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            metrics: dir.join(METRICS_FILE),
            results: dir.join(RESULTS_FILE),
            roc: dir.join(ROC_FILE),
        }
    }
}

/// Score a reference CSV with `bundle` and write all calibration artifacts
pub fn run_calibration(
    bundle: &ModelBundle,
    reference: &Path,
    outputs: &CalibrationOutputs,
    config: CalibrationConfig,
) -> SohResult<CalibrationReport> {
    let records = read_reference(reference)?;
    let scored = score_reference(bundle, records)?;

    let samples: Vec<ReferenceSample> = scored
        .iter()
        .map(|s| ReferenceSample { prediction: s.prediction, truth: s.record.soh_teacher })
        .collect();

    let report = ResidualCalibrator::new(config).calibrate(&samples)?;

    write_metrics_table(&outputs.metrics, &report.metric_rows())?;
    dataset::write_results(&outputs.results, &scored, &report)?;
    dataset::write_roc(&outputs.roc, &report.roc)?;

    log::info!("Calibration artifacts written to {}", outputs.metrics.display());
    Ok(report)
}
